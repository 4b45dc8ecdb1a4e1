//! tokio-postgres implementation of the connection seam.

use std::error::Error as StdError;
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use redline_core::{
    config::ConnectionConfig,
    error::{BoxError, Error, Result},
    logging::{debug, error},
    Connection, Row, SqlValue, Transaction,
};
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type};
use tokio_postgres::NoTls;

use crate::consts;

/// A single connection to a Redshift cluster.
pub struct RedshiftClient {
    client: tokio_postgres::Client,
}

impl RedshiftClient {
    /// Connect using the given config. The connection driver runs on a
    /// spawned task until the client is dropped.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let mut pg = tokio_postgres::Config::new();
        pg.host(&config.host)
            .port(config.port)
            .dbname(&config.database)
            .user(&config.user)
            .application_name("redline");
        if let Some(password) = config.password() {
            pg.password(password);
        }
        if let Some(secs) = config.connect_timeout_secs {
            pg.connect_timeout(Duration::from_secs(secs));
        }

        debug!(
            "connecting to {}:{}/{} as {}",
            config.host, config.port, config.database, config.user
        );
        let (client, connection) = pg
            .connect(NoTls)
            .await
            .map_err(|e| Error::Connection(e.into()))?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("connection error: {}", e);
            }
        });
        Ok(Self { client })
    }

    /// Check that the connection works.
    pub async fn check(&self) -> bool {
        match self.client.simple_query(consts::PING).await {
            Err(e) => {
                error!("{:?}", e);
                false
            }
            Ok(_) => true,
        }
    }
}

#[async_trait]
impl Connection for RedshiftClient {
    async fn begin<'a>(&'a mut self) -> Result<Box<dyn Transaction + 'a>, BoxError> {
        let tx = self.client.transaction().await?;
        Ok(Box::new(RedshiftTransaction(tx)))
    }
}

struct RedshiftTransaction<'a>(tokio_postgres::Transaction<'a>);

#[async_trait]
impl Transaction for RedshiftTransaction<'_> {
    async fn query_row(&mut self, sql: &str, params: &[SqlValue]) -> Result<Option<Row>, BoxError> {
        let params = params.iter().map(Param).collect::<Vec<_>>();
        let row = self.0.query_opt(sql, &param_refs(&params)).await?;
        Ok(row.as_ref().map(convert_row).transpose()?)
    }

    async fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, BoxError> {
        let params = params.iter().map(Param).collect::<Vec<_>>();
        let rows = self.0.query(sql, &param_refs(&params)).await?;
        Ok(rows.iter().map(convert_row).collect::<Result<Vec<_>, _>>()?)
    }

    async fn execute(&mut self, sql: &str) -> Result<u64, BoxError> {
        Ok(self.0.execute(sql, &[]).await?)
    }

    async fn commit(self: Box<Self>) -> Result<(), BoxError> {
        Ok(self.0.commit().await?)
    }

    async fn rollback(self: Box<Self>) -> Result<(), BoxError> {
        Ok(self.0.rollback().await?)
    }
}

fn param_refs<'p>(params: &'p [Param<'_>]) -> Vec<&'p (dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

/// Widen driver values into seam values. Anything that isn't a bool or an
/// integer is read as text.
fn convert_row(row: &tokio_postgres::Row) -> Result<Row, tokio_postgres::Error> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let value = match *column.type_() {
                Type::BOOL => row.try_get::<_, Option<bool>>(i)?.map(SqlValue::Bool),
                Type::INT2 => row
                    .try_get::<_, Option<i16>>(i)?
                    .map(|v| SqlValue::Int(v.into())),
                Type::INT4 => row
                    .try_get::<_, Option<i32>>(i)?
                    .map(|v| SqlValue::Int(v.into())),
                Type::INT8 => row.try_get::<_, Option<i64>>(i)?.map(SqlValue::Int),
                Type::OID => row
                    .try_get::<_, Option<u32>>(i)?
                    .map(|v| SqlValue::Int(v.into())),
                _ => row.try_get::<_, Option<String>>(i)?.map(SqlValue::Text),
            };
            Ok(value.unwrap_or(SqlValue::Null))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Row)
}

/// Borrowed seam value bound as a statement parameter.
#[derive(Debug)]
struct Param<'v>(&'v SqlValue);

impl ToSql for Param<'_> {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> std::result::Result<IsNull, Box<dyn StdError + Sync + Send>> {
        match self.0 {
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Bool(v) => v.to_sql(ty, out),
            SqlValue::Int(v) => match *ty {
                Type::INT2 => i16::try_from(*v)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql(ty, out),
                Type::OID => u32::try_from(*v)?.to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            SqlValue::Text(v) => v.as_str().to_sql(ty, out),
        }
    }

    fn accepts(ty: &Type) -> bool {
        <bool as ToSql>::accepts(ty)
            || <i16 as ToSql>::accepts(ty)
            || <i32 as ToSql>::accepts(ty)
            || <i64 as ToSql>::accepts(ty)
            || <u32 as ToSql>::accepts(ty)
            || <&str as ToSql>::accepts(ty)
    }

    to_sql_checked!();
}

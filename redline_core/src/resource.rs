//! The lifecycle hooks a host drives for each managed resource.

use async_trait::async_trait;

use crate::connection::Connection;
use crate::error::Result;

/// A resource whose state lives in the warehouse catalog.
///
/// State is always passed in and returned by value. Implementations keep
/// nothing between calls; the catalog is the system of record.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Stable identifier of one managed instance.
    type Id: Send + Sync;
    /// What the configuration asks for.
    type Desired: Send + Sync;
    /// What was observed in the catalog.
    type State: Send + Sync;

    /// Create the instance and return its id with the state read back
    /// inside the creating transaction.
    async fn create(
        &self,
        conn: &mut dyn Connection,
        desired: &Self::Desired,
    ) -> Result<(Self::Id, Self::State)>;

    /// Observe the current state.
    async fn read(&self, conn: &mut dyn Connection, id: &Self::Id) -> Result<Self::State>;

    /// Move from `previous` to `desired`, returning the state read back
    /// before commit.
    async fn update(
        &self,
        conn: &mut dyn Connection,
        id: &Self::Id,
        previous: &Self::State,
        desired: &Self::Desired,
    ) -> Result<Self::State>;

    /// Remove the instance.
    async fn delete(&self, conn: &mut dyn Connection, id: &Self::Id) -> Result<()>;

    /// Whether the instance is still present.
    async fn exists(&self, conn: &mut dyn Connection, id: &Self::Id) -> Result<bool>;

    /// Adopt an instance that already exists.
    async fn import(&self, conn: &mut dyn Connection, id: &Self::Id) -> Result<Self::State> {
        self.read(conn, id).await
    }
}

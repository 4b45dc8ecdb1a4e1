//! Runs one reconcile call inside one transaction.

use std::fmt::Display;

use redline_core::{
    error::{Error, Result},
    logging::{debug, error},
    Connection, Transaction,
};

/// Where a reconcile call is. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Validating,
    ResolvingNames,
    Diffing,
    Executing,
    ReadingBack,
    Committing,
    Done,
    RollingBack,
    Failed,
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Validating => "validating",
            Phase::ResolvingNames => "resolving names",
            Phase::Diffing => "diffing",
            Phase::Executing => "executing",
            Phase::ReadingBack => "reading back",
            Phase::Committing => "committing",
            Phase::Done => "done",
            Phase::RollingBack => "rolling back",
            Phase::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Run checks that must pass before a transaction is opened.
pub(crate) fn validate<T>(check: impl FnOnce() -> Result<T>) -> Result<T> {
    debug!("phase: {}", Phase::Validating);
    check().map_err(|e| {
        debug!("phase: {} ({e})", Phase::Failed);
        e
    })
}

/// Owns the open transaction for the length of one reconcile call.
pub(crate) struct TransactionExecutor<'c> {
    tx: Box<dyn Transaction + 'c>,
    phase: Phase,
}

impl<'c> TransactionExecutor<'c> {
    pub(crate) async fn begin(conn: &'c mut dyn Connection) -> Result<TransactionExecutor<'c>> {
        let tx = conn.begin().await.map_err(Error::Begin)?;
        let mut res = Self {
            tx,
            phase: Phase::Validating,
        };
        res.enter(Phase::ResolvingNames);
        Ok(res)
    }

    pub(crate) fn enter(&mut self, phase: Phase) {
        debug!("phase: {} -> {}", self.phase, phase);
        self.phase = phase;
    }

    /// The open transaction, for catalog reads.
    pub(crate) fn tx(&mut self) -> &mut (dyn Transaction + 'c) {
        self.tx.as_mut()
    }

    /// Run statements in order, stopping at the first failure.
    pub(crate) async fn execute_all(&mut self, statements: &[String]) -> Result<()> {
        self.enter(Phase::Executing);
        for statement in statements {
            debug!("executing: {statement}");
            self.tx
                .execute(statement)
                .await
                .map_err(|source| Error::Execution {
                    statement: statement.to_owned(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Commit on success, roll back on failure. Either way the transaction
    /// is closed when this returns.
    pub(crate) async fn finish<T>(self, outcome: Result<T>) -> Result<T> {
        match outcome {
            Ok(value) => self.commit().await.map(|_| value),
            Err(e) => Err(self.abort(e).await),
        }
    }

    async fn commit(mut self) -> Result<()> {
        self.enter(Phase::Committing);
        let TransactionExecutor { tx, phase } = self;
        if let Err(e) = tx.commit().await {
            error!("commit failed: {e}");
            debug!("phase: {} -> {}", phase, Phase::Failed);
            return Err(Error::Commit(e));
        }
        debug!("phase: {} -> {}", phase, Phase::Done);
        Ok(())
    }

    /// Roll back and hand back the error that caused it. A rollback failure
    /// is logged and never replaces the original error.
    async fn abort(mut self, err: Error) -> Error {
        self.enter(Phase::RollingBack);
        let TransactionExecutor { tx, phase } = self;
        if let Err(e) = tx.rollback().await {
            error!("rollback failed after \"{err}\": {e}");
        }
        debug!("phase: {} -> {} ({err})", phase, Phase::Failed);
        err
    }
}

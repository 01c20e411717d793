//! Work parked until a reference it depends on is registered.
//!
//! Result maps extending an unknown parent, cache-refs to an unknown
//! namespace and statements referring to unknown result maps, parameter
//! maps, fragments or an unresolved cache-ref fail with an incomplete element
//! error. That failure is expected: the job is queued and retried after every
//! load, and once more when the configuration is finished.

use super::{statement, Assistant};
use crate::{xml::XNode, Configuration};
use sqlmap_core::{
    mapping::{Discriminator, ResultMap, ResultMapping},
    ty::TypeName,
    Error, Result,
};
use std::{fmt, mem};

pub(crate) trait Job: fmt::Debug + fmt::Display + Sized {
    fn run(&self, config: &mut Configuration) -> Result<()>;

    fn queue(pending: &mut Pending) -> &mut Vec<Deferred<Self>>;
}

#[derive(Debug)]
pub(crate) struct Deferred<J> {
    job: J,

    /// Why the last attempt failed.
    cause: Error,
}

#[derive(Debug, Default)]
pub(crate) struct Pending {
    result_maps: Vec<Deferred<ResultMapJob>>,
    cache_refs: Vec<Deferred<CacheRefJob>>,
    statements: Vec<Deferred<StatementJob>>,
}

/// Queue lengths at some point in time.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Checkpoint {
    result_maps: usize,
    cache_refs: usize,
    statements: usize,
}

impl Pending {
    pub(crate) fn len(&self) -> usize {
        self.result_maps.len() + self.cache_refs.len() + self.statements.len()
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            result_maps: self.result_maps.len(),
            cache_refs: self.cache_refs.len(),
            statements: self.statements.len(),
        }
    }

    /// Forgets everything deferred since `checkpoint` was taken.
    pub(crate) fn rollback(&mut self, checkpoint: Checkpoint) {
        self.result_maps.truncate(checkpoint.result_maps);
        self.cache_refs.truncate(checkpoint.cache_refs);
        self.statements.truncate(checkpoint.statements);
    }

    /// Whether a statement declared for the configured database is still
    /// waiting under `id`.
    pub(crate) fn has_database_statement(&self, id: &str) -> bool {
        self.statements.iter().any(|deferred| {
            deferred.job.required_database_id.is_some()
                && deferred
                    .job
                    .node
                    .attr("id")
                    .and_then(|own| deferred.job.assistant.apply(own, false).ok())
                    .is_some_and(|own| own == id)
        })
    }

    fn first_failure(&self) -> Option<Error> {
        fn failure<J: fmt::Display>(deferred: &Deferred<J>) -> Error {
            deferred.cause.clone().context(Error::unresolved_reference(format!(
                "{} could not be resolved",
                deferred.job
            )))
        }

        self.result_maps
            .first()
            .map(failure)
            .or_else(|| self.cache_refs.first().map(failure))
            .or_else(|| self.statements.first().map(failure))
    }
}

/// Runs `job` now. If a reference is missing the job is parked instead.
pub(crate) fn attempt<J: Job>(config: &mut Configuration, job: J) -> Result<()> {
    match job.run(config) {
        Ok(()) => Ok(()),
        Err(cause) if cause.is_incomplete_element() => {
            tracing::debug!(%job, %cause, "deferring until the reference is registered");
            J::queue(&mut config.pending).push(Deferred { job, cause });
            Ok(())
        }
        Err(err) => Err(err),
    }
}

/// Retries every queue until a pass resolves nothing more. On the final pass
/// anything left over is an error. An item failing with anything other than
/// a missing reference stays queued, so later retries report it again.
pub(crate) fn retry(config: &mut Configuration, final_pass: bool) -> Result<()> {
    loop {
        let before = config.pending.len();
        if before == 0 {
            break;
        }

        retry_queue::<ResultMapJob>(config)?;
        retry_queue::<CacheRefJob>(config)?;
        retry_queue::<StatementJob>(config)?;

        let after = config.pending.len();
        tracing::trace!(before, after, final_pass, "retried pending items");
        if after == before {
            break;
        }
    }

    match config.pending.first_failure() {
        Some(err) if final_pass => Err(err),
        _ => Ok(()),
    }
}

fn retry_queue<J: Job>(config: &mut Configuration) -> Result<()> {
    let mut jobs = mem::take(J::queue(&mut config.pending)).into_iter();

    while let Some(Deferred { job, .. }) = jobs.next() {
        match job.run(config) {
            Ok(()) => tracing::debug!(%job, "resolved deferred item"),
            Err(cause) if cause.is_incomplete_element() => {
                J::queue(&mut config.pending).push(Deferred { job, cause });
            }
            Err(err) => {
                let queue = J::queue(&mut config.pending);
                queue.push(Deferred {
                    job,
                    cause: err.clone(),
                });
                queue.extend(jobs);
                return Err(err);
            }
        }
    }

    Ok(())
}

/// A result map whose mappings are built; registering it may still wait for
/// the parent named by `extends`.
#[derive(Debug)]
pub(crate) struct ResultMapJob {
    pub(crate) id: String,
    pub(crate) resource: String,
    pub(crate) ty: TypeName,
    pub(crate) extends: Option<String>,
    pub(crate) mappings: Vec<ResultMapping>,
    pub(crate) discriminator: Option<Discriminator>,
    pub(crate) auto_mapping: Option<bool>,
}

impl Job for ResultMapJob {
    fn run(&self, config: &mut Configuration) -> Result<()> {
        let mut mappings = self.mappings.clone();

        if let Some(parent_id) = &self.extends {
            let parent = config.result_maps.lookup(parent_id).map_err(|err| {
                super::defer_missing(err, || {
                    format!("could not find a parent result map with id '{parent_id}'")
                })
            })?;

            let declares_constructor = mappings.iter().any(ResultMapping::is_constructor);

            // Mappings redeclared by the child replace the parent's.
            let inherited: Vec<_> = parent
                .mappings
                .iter()
                .filter(|mapping| {
                    !mappings.iter().any(|own| {
                        own.property.is_some() && own.property == mapping.property
                    })
                })
                .filter(|mapping| !(declares_constructor && mapping.is_constructor()))
                .cloned()
                .collect();

            mappings.extend(inherited);
        }

        let result_map = ResultMap::builder(self.id.clone(), self.ty.clone(), mappings)
            .discriminator(self.discriminator.clone())
            .auto_mapping(self.auto_mapping)
            .build(&config.types.registry)?;

        config.add_result_map(result_map)
    }

    fn queue(pending: &mut Pending) -> &mut Vec<Deferred<Self>> {
        &mut pending.result_maps
    }
}

impl fmt::Display for ResultMapJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "result map '{}' in '{}'", self.id, self.resource)
    }
}

#[derive(Debug)]
pub(crate) struct CacheRefJob {
    pub(crate) namespace: String,
    pub(crate) referenced: String,
    pub(crate) resource: String,
}

impl Job for CacheRefJob {
    fn run(&self, config: &mut Configuration) -> Result<()> {
        config.resolve_cache_ref(&self.namespace, &self.referenced)
    }

    fn queue(pending: &mut Pending) -> &mut Vec<Deferred<Self>> {
        &mut pending.cache_refs
    }
}

impl fmt::Display for CacheRefJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cache-ref from '{}' to '{}' in '{}'",
            self.namespace, self.referenced, self.resource
        )
    }
}

/// A statement element, compiled from scratch on every attempt.
#[derive(Debug)]
pub(crate) struct StatementJob {
    pub(crate) assistant: Assistant,
    pub(crate) node: XNode,

    /// The database id the statement must declare, or `None` for statements
    /// declaring none.
    pub(crate) required_database_id: Option<String>,
}

impl Job for StatementJob {
    fn run(&self, config: &mut Configuration) -> Result<()> {
        statement::build(config, self)
    }

    fn queue(pending: &mut Pending) -> &mut Vec<Deferred<Self>> {
        &mut pending.statements
    }
}

impl fmt::Display for StatementJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "statement '{}' in '{}'",
            self.node.attr("id").unwrap_or("<unnamed>"),
            self.assistant.resource()
        )
    }
}

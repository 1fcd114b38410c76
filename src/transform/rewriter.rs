//! Traversal driver: finds qualifying labels and rewrites or strips them.

use std::collections::HashSet;

use serde::Serialize;

use crate::aliases::{AliasTable, SynthInput, Synthesizer};
use crate::ast::builder::ensure_statement;
use crate::ast::{NodeId, NodeKind, Tree};
use crate::diagnostics::SourceArc;
use crate::environment::Environment;
use crate::options::Options;
use crate::transform::metadata::{self, FileInfo, Metadata};
use crate::transform::{purity, strip};
use crate::MetalogError;

/// Counters for one rewritten file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Qualifying labels encountered.
    pub labels: usize,
    /// Labels deleted by the strip policy.
    pub stripped: usize,
    /// Log calls synthesized.
    pub calls: usize,
}

pub struct Rewriter<'a> {
    tree: &'a mut Tree,
    file: &'a FileInfo,
    source: &'a SourceArc,
    options: &'a Options,
    aliases: &'a AliasTable,
    env: &'a Environment,
    /// Statements synthesized in this pass; never revisited.
    handled: HashSet<NodeId>,
    stats: Stats,
}

impl<'a> Rewriter<'a> {
    pub fn new(
        tree: &'a mut Tree,
        file: &'a FileInfo,
        source: &'a SourceArc,
        options: &'a Options,
        aliases: &'a AliasTable,
        env: &'a Environment,
    ) -> Self {
        Self {
            tree,
            file,
            source,
            options,
            aliases,
            env,
            handled: HashSet::new(),
            stats: Stats::default(),
        }
    }

    /// Walks the tree once in source order. A processed label is replaced by
    /// its body, which is then walked in its place, so nested labels are
    /// reached after their enclosing one.
    pub fn run(mut self) -> Result<Stats, MetalogError> {
        let mut pending = vec![self.tree.root()];
        while let Some(id) = pending.pop() {
            if self.handled.contains(&id) {
                continue;
            }
            if let Some((label, synthesizer)) = self.qualifying(id) {
                let replacements = self.process(id, &label, &synthesizer)?;
                pending.extend(replacements.into_iter().rev());
                continue;
            }
            pending.extend(self.tree.kind(id).children().into_iter().rev());
        }
        Ok(self.stats)
    }

    fn qualifying(&self, id: NodeId) -> Option<(String, Synthesizer)> {
        match self.tree.kind(id) {
            NodeKind::Labeled { label, .. } => self
                .aliases
                .get(label)
                .map(|synth| (label.clone(), synth.clone())),
            _ => None,
        }
    }

    /// Handles one qualifying label; returns the nodes now standing in its place.
    fn process(
        &mut self,
        id: NodeId,
        label: &str,
        synthesizer: &Synthesizer,
    ) -> Result<Vec<NodeId>, MetalogError> {
        self.stats.labels += 1;
        let metadata = metadata::collect(self.tree, id, self.file, self.aliases, &self.handled);

        if strip::should_strip(label, &metadata, self.options, self.env) {
            tracing::debug!(
                label,
                line = metadata.line,
                parent_path = %metadata.context(),
                "stripped logging statement"
            );
            self.tree.remove(id)?;
            self.stats.stripped += 1;
            return Ok(Vec::new());
        }

        let body = match self.tree.kind(id) {
            NodeKind::Labeled { body, .. } => *body,
            _ => return Ok(vec![id]),
        };
        purity::check(
            self.tree,
            body,
            label,
            self.aliases,
            self.source,
            &self.file.filename,
        )?;

        for statement in self.expression_statements(body) {
            self.rewrite_statement(statement, synthesizer, &metadata)?;
        }

        // The body slot may have been replaced by a rewrite.
        let body = match self.tree.kind(id) {
            NodeKind::Labeled { body, .. } => *body,
            _ => body,
        };
        let replacements = match self.tree.kind(body) {
            NodeKind::Block { body } => body.clone(),
            NodeKind::Empty => Vec::new(),
            _ => vec![body],
        };
        self.tree.replace_with_many(id, replacements.clone())?;
        tracing::debug!(
            label,
            line = metadata.line,
            parent_path = %metadata.context(),
            "rewrote logging statement"
        );
        Ok(replacements)
    }

    /// Expression statements under `body`, in source order, skipping nested
    /// qualifying labels and already handled statements.
    fn expression_statements(&self, body: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut pending = vec![body];
        while let Some(id) = pending.pop() {
            if self.handled.contains(&id) {
                continue;
            }
            match self.tree.kind(id) {
                NodeKind::Expression { .. } => found.push(id),
                NodeKind::Labeled { label, .. } if id != body && self.aliases.contains(label) => {}
                kind => pending.extend(kind.children().into_iter().rev()),
            }
        }
        found
    }

    fn rewrite_statement(
        &mut self,
        statement: NodeId,
        synthesizer: &Synthesizer,
        metadata: &Metadata,
    ) -> Result<(), MetalogError> {
        let NodeKind::Expression { expr } = self.tree.kind(statement).clone() else {
            return Ok(());
        };
        let content = match self.tree.kind(expr) {
            NodeKind::Sequence { expressions } => expressions.clone(),
            _ => vec![expr],
        };
        let span = self.tree.span(statement);
        let synthesized = synthesizer.synthesize(
            self.tree,
            SynthInput {
                log_function: &self.options.log_function,
                content,
                metadata,
                span,
            },
        )?;
        let replacement = ensure_statement(self.tree, synthesized);
        self.tree.replace(statement, replacement)?;
        self.handled.insert(replacement);
        self.stats.calls += 1;
        Ok(())
    }
}

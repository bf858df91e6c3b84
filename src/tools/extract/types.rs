use crate::tools::document::{DocumentIndex, Node};
use crate::types::EmbeddedResource;

/// Everything a field extractor may look at for one card.
#[derive(Clone, Copy)]
pub struct CardContext<'a> {
    pub doc: &'a DocumentIndex,
    pub card: Node<'a>,
    /// Position in the located set, used to tag diagnostics.
    pub index: usize,
    pub resources: &'a [EmbeddedResource],
}

impl<'a> CardContext<'a> {
    pub fn new(
        doc: &'a DocumentIndex,
        card: Node<'a>,
        index: usize,
        resources: &'a [EmbeddedResource],
    ) -> Self {
        Self {
            doc,
            card,
            index,
            resources,
        }
    }
}

/// A hit from a candidate chain: the value and which candidate produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit<T> {
    pub value: T,
    pub rank: usize,
}

//! Card Tools
//!
//! Finds the repeated ad containers. There is deliberately no fallback here:
//! an empty result is reported as "no cards" and the run ends cleanly.

use crate::config::Sel;
use crate::error::Result;
use crate::tools::document::{DocumentIndex, Node, Query};

#[derive(Debug, Clone)]
pub struct CardLocator {
    container: Query,
}

impl CardLocator {
    pub fn new(container: &Sel) -> Result<Self> {
        Ok(Self {
            container: Query::parse(&container.0)?,
        })
    }

    /// Containers in document order; empty means no cards.
    pub fn locate<'a>(&self, doc: &'a DocumentIndex) -> Vec<Node<'a>> {
        doc.query(&self.container)
    }

    pub fn selector(&self) -> &str {
        self.container.as_str()
    }
}

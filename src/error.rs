use thiserror::Error;

use crate::graph::GraphError;
use crate::layout::LayoutError;

/// Anything that aborts a conversion. None of these are transient: the same
/// input fails the same way every time.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Couldn't build the dependency graph.\n{0}")]
    Graph(#[from] GraphError),

    #[error("Couldn't lay out the diagram.\n{0}")]
    Layout(#[from] LayoutError),

    #[error("Invalid blacklist pattern.\n{0}")]
    Blacklist(#[from] regex::Error),
}

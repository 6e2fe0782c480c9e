use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("undefined corner '{0}', expected one of tl, tr, bl, br")]
    UndefinedCorner(String),

    #[error("node '{0}' does not exist")]
    UnknownNode(String),

    #[error("placing '{node}' inside '{container}' would nest it inside itself")]
    ContainmentCycle { node: String, container: String },
}

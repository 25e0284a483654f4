/// Kinds of access a caller can request against a resource type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Get,
    List,
    Update,
    Delete,
}

impl Operation {
    /// Operation name reported as `origin` in response bodies.
    pub fn origin(&self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Get => "get",
            Operation::List => "list",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    /// Ancestor count a request must carry for a resource of `root_depth`.
    ///
    /// Add and list address the collection; get, update and delete address a
    /// single record whose id is the final ancestor.
    pub fn expected_depth(&self, root_depth: usize) -> usize {
        match self {
            Operation::Add | Operation::List => root_depth,
            Operation::Get | Operation::Update | Operation::Delete => root_depth + 1,
        }
    }
}

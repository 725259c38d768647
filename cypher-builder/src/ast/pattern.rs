use super::{Expression, Variable};

/// `(variable:Label { key: value })`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodePattern {
    pub variable: Option<Variable>,
    pub labels: Vec<String>,
    pub properties: Vec<(String, Expression)>,
}

impl NodePattern {
    pub fn new(variable: impl Into<Variable>) -> Self {
        Self {
            variable: Some(variable.into()),
            ..Default::default()
        }
    }

    /// A node without variable, `()`.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    pub fn labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels.extend(labels.into_iter().map(Into::into));
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: Expression) -> Self {
        self.properties.push((key.into(), value));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternDirection {
    /// `-[]->`
    Outgoing,
    /// `<-[]-`
    Incoming,
    /// `-[]-`
    Undirected,
}

/// `-[variable:TYPE { key: value }]->`
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipPattern {
    pub variable: Option<Variable>,
    pub rel_type: Option<String>,
    pub direction: PatternDirection,
    pub properties: Vec<(String, Expression)>,
}

impl RelationshipPattern {
    pub fn new(direction: PatternDirection) -> Self {
        Self {
            variable: None,
            rel_type: None,
            direction,
            properties: Vec::new(),
        }
    }

    pub fn variable(mut self, variable: impl Into<Variable>) -> Self {
        self.variable = Some(variable.into());
        self
    }

    pub fn rel_type(mut self, rel_type: impl Into<String>) -> Self {
        self.rel_type = Some(rel_type.into());
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: Expression) -> Self {
        self.properties.push((key.into(), value));
        self
    }
}

/// A path of nodes joined by relationships.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub start: NodePattern,
    pub chain: Vec<(RelationshipPattern, NodePattern)>,
}

impl Pattern {
    pub fn node(start: NodePattern) -> Self {
        Self {
            start,
            chain: Vec::new(),
        }
    }

    pub fn related(mut self, relationship: RelationshipPattern, node: NodePattern) -> Self {
        self.chain.push((relationship, node));
        self
    }
}

impl From<NodePattern> for Pattern {
    fn from(node: NodePattern) -> Self {
        Pattern::node(node)
    }
}

use crate::{Error, Result, ast::Variable};
use indexmap::IndexSet;

/// Variables visible at a point of a statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    variables: IndexSet<String>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_variables<'a>(variables: impl IntoIterator<Item = &'a Variable>) -> Self {
        Self {
            variables: variables.into_iter().map(|v| v.name().to_owned()).collect(),
        }
    }

    pub fn contains(&self, variable: &Variable) -> bool {
        self.variables.contains(variable.name())
    }

    /// Fails if the variable is not bound.
    pub fn check(&self, variable: &Variable) -> Result<()> {
        if self.contains(variable) {
            Ok(())
        } else {
            Err(Error::UndefinedVariable {
                name: variable.name().to_owned(),
            })
        }
    }

    /// Binds a new variable. Fails if it is already bound.
    pub fn declare(&mut self, variable: &Variable) -> Result<()> {
        if self.variables.insert(variable.name().to_owned()) {
            Ok(())
        } else {
            Err(Error::VariableAlreadyDeclared {
                name: variable.name().to_owned(),
            })
        }
    }

    /// Binds the variable unless it is already bound.
    pub fn bind(&mut self, variable: &Variable) {
        self.variables.insert(variable.name().to_owned());
    }

    pub fn remove(&mut self, variable: &Variable) {
        self.variables.shift_remove(variable.name());
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redeclaring_fails() {
        let this = Variable::new("this");
        let mut scope = Scope::new();

        scope.declare(&this).unwrap();

        assert_eq!(
            Err(Error::VariableAlreadyDeclared { name: "this".into() }),
            scope.declare(&this)
        );
    }

    #[test]
    fn binding_is_idempotent() {
        let this = Variable::new("this");
        let mut scope = Scope::new();

        scope.bind(&this);
        scope.bind(&this);

        assert_eq!(vec!["this"], scope.variables().collect::<Vec<_>>());
        assert_eq!(
            Err(Error::UndefinedVariable { name: "that".into() }),
            scope.check(&Variable::new("that"))
        );
    }
}

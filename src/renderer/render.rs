use minijinja::{Environment, ErrorKind, UndefinedBehavior};

use super::{
    collect::VariableSet,
    error::{Error, Result},
    filters,
};

// Engine globals that are never part of the variable set.
const BUILTINS: &[&str] = &["range", "dict", "debug", "namespace"];

/// Renders `template` strictly: any undefined reference is an error and a
/// trailing newline in the source is kept.
pub fn render(template: &str, variables: &VariableSet) -> Result<String> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(true);
    filters::register(&mut env);

    let template = env.template_from_str(template)?;
    template.render(variables).map_err(|e| {
        if !matches!(e.kind(), ErrorKind::UndefinedError) {
            return Error::Template(e);
        }
        let mut missing: Vec<String> = template
            .undeclared_variables(false)
            .into_iter()
            .filter(|name| variables.get(name).is_none() && !BUILTINS.contains(&name.as_str()))
            .collect();
        missing.sort();
        if missing.is_empty() {
            Error::UndefinedVariable(e.to_string())
        } else {
            Error::UndefinedVariable(missing.join(", "))
        }
    })
}

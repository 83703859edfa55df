use minijinja::{AutoEscape, Environment, ErrorKind, UndefinedBehavior, Value};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template '{name}' is not valid UTF-8: {source}")]
    InvalidUtf8 {
        name: String,
        #[source]
        source: std::str::Utf8Error,
    },
    #[error("failed to render template '{name}': {source}")]
    Render {
        name: String,
        #[source]
        source: minijinja::Error,
    },
}

impl TemplateError {
    /// Name of the template that failed.
    pub fn name(&self) -> &str {
        match self {
            Self::InvalidUtf8 { name, .. } | Self::Render { name, .. } => name,
        }
    }
}

/// The functions a template may call, by name. Nothing else is in scope:
/// no filters, no globals, no loader.
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    functions: BTreeMap<String, Value>,
}

impl FunctionTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// `indent` and `add`, the table bootstrap templates are written against.
    pub fn standard() -> Self {
        Self::empty()
            .with(
                "indent",
                Value::from_function(|width: usize, text: String| indent(width, &text)),
            )
            .with("add", Value::from_function(add))
    }

    /// Add or replace `name`; build the callable with `Value::from_function`.
    #[must_use]
    pub fn with(mut self, name: &str, function: Value) -> Self {
        self.functions.insert(name.to_owned(), function);
        self
    }

    #[must_use]
    pub fn without(mut self, name: &str) -> Self {
        self.functions.remove(name);
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.functions.keys().map(String::as_str).collect()
    }

    fn environment<'s>(&self) -> Environment<'s> {
        let mut env = Environment::empty();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_keep_trailing_newline(true);
        for (name, function) in &self.functions {
            env.add_global(name.clone(), function.clone());
        }
        env
    }
}

/// Insert `width` spaces after every newline in `text`.
pub fn indent(width: usize, text: &str) -> String {
    let newline = format!("\n{}", " ".repeat(width));
    text.replace('\n', &newline)
}

pub fn add(i: i64, j: i64) -> Result<i64, minijinja::Error> {
    i.checked_add(j).ok_or_else(|| {
        minijinja::Error::new(
            ErrorKind::InvalidOperation,
            format!("integer overflow in add({i}, {j})"),
        )
    })
}

/// Evaluate `template` against `context` with exactly the functions in `functions`.
pub fn render(
    name: &str,
    template: &[u8],
    context: &impl Serialize,
    functions: &FunctionTable,
) -> Result<Vec<u8>, TemplateError> {
    let source = std::str::from_utf8(template).map_err(|source| TemplateError::InvalidUtf8 {
        name: name.to_owned(),
        source,
    })?;
    let wrap = |source| TemplateError::Render {
        name: name.to_owned(),
        source,
    };

    let env = functions.environment();
    let tmpl = env.template_from_named_str(name, source).map_err(wrap)?;
    let out = tmpl.render(Value::from_serialize(context)).map_err(wrap)?;
    Ok(out.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Ctx {
        name: &'static str,
        cert: &'static str,
        hosts: Vec<&'static str>,
    }

    fn ctx() -> Ctx {
        Ctx {
            name: "demo",
            cert: "line1\nline2\nline3",
            hosts: vec!["demo-etcd-0", "demo-etcd-1"],
        }
    }

    fn render_str(src: &str, table: &FunctionTable) -> Result<String, TemplateError> {
        render("t.yaml", src.as_bytes(), &ctx(), table)
            .map(|out| String::from_utf8(out).unwrap())
    }

    #[test]
    fn indent_pads_every_newline() {
        assert_eq!(indent(2, "a\nb"), "a\n  b");
        assert_eq!(indent(4, "x\ny\n"), "x\n    y\n    ");
        assert_eq!(indent(3, "single"), "single");
        assert_eq!(indent(0, "a\nb"), "a\nb");
    }

    #[test]
    fn add_sums_and_rejects_overflow() {
        assert_eq!(add(3, 4).unwrap(), 7);
        assert_eq!(add(-1, 1).unwrap(), 0);
        assert_eq!(add(i64::MAX, 1).unwrap_err().kind(), ErrorKind::InvalidOperation);
    }

    #[test]
    fn renders_fields_and_functions() {
        let out = render_str(
            "name: {{ name }}\ncert: |\n    {{ indent(4, cert) }}\n",
            &FunctionTable::standard(),
        )
        .unwrap();
        assert_eq!(out, "name: demo\ncert: |\n    line1\n    line2\n    line3\n");
    }

    #[test]
    fn loop_index_with_add() {
        let out = render_str(
            "{% for h in hosts %}{{ h }}={{ add(loop.index0, 1) }};{% endfor %}",
            &FunctionTable::standard(),
        )
        .unwrap();
        assert_eq!(out, "demo-etcd-0=1;demo-etcd-1=2;");
    }

    #[test]
    fn undefined_field_is_an_error() {
        let err = render_str("{{ nope }}", &FunctionTable::standard()).unwrap_err();
        assert_eq!(err.name(), "t.yaml");
        match err {
            TemplateError::Render { source, .. } => {
                assert_eq!(source.kind(), ErrorKind::UndefinedError);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_function_is_an_error() {
        let table = FunctionTable::standard().without("indent");
        assert_eq!(table.names(), vec!["add"]);
        assert!(render_str("{{ indent(2, cert) }}", &table).is_err());
        assert!(render_str("{{ add(1, 2) }}", &FunctionTable::empty()).is_err());
    }

    #[test]
    fn builtin_filters_are_not_available() {
        assert!(render_str("{{ name | upper }}", &FunctionTable::standard()).is_err());
    }

    #[test]
    fn custom_function_is_callable() {
        let table = FunctionTable::empty()
            .with("shout", Value::from_function(|s: String| s.to_uppercase()));
        assert_eq!(render_str("{{ shout(name) }}", &table).unwrap(), "DEMO");
    }

    #[test]
    fn keeps_trailing_newline_and_does_not_escape() {
        let out = render(
            "page.html",
            b"<{{ name }}>&\n",
            &ctx(),
            &FunctionTable::standard(),
        )
        .unwrap();
        assert_eq!(out, b"<demo>&\n");
    }

    #[test]
    fn invalid_utf8_is_reported() {
        let err = render("bin", &[0xff, 0xfe], &ctx(), &FunctionTable::standard()).unwrap_err();
        assert!(matches!(err, TemplateError::InvalidUtf8 { .. }));
        assert_eq!(err.name(), "bin");
    }

    #[test]
    fn syntax_error_names_the_template() {
        let err = render_str("{% for %}", &FunctionTable::standard()).unwrap_err();
        assert!(err.to_string().contains("t.yaml"));
    }
}

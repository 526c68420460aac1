//! Logging capability injected into the handler.
//!
//! Templates use named placeholders (`"Received {message}"`); arguments fill
//! them positionally, in the order the placeholders appear.

/// Informational logging capability
pub trait Logger: Send + Sync {
    fn info(&self, template: &str, args: &[&str]);
}

/// [`Logger`] backed by `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn info(&self, template: &str, args: &[&str]) {
        let rendered = render_template(template, args);
        tracing::info!(template = template, "{}", rendered);
    }
}

/// Substitute `{name}` placeholders with `args` in order.
///
/// Placeholders without a matching argument stay verbatim; extra arguments
/// are ignored. An unterminated `{` is copied through as-is.
pub fn render_template(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        match tail.find('}') {
            Some(end) => {
                match args.next() {
                    Some(arg) => out.push_str(arg),
                    None => out.push_str(&tail[..=end]),
                }
                rest = &tail[end + 1..];
            }
            None => {
                out.push_str(tail);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_in_order() {
        let out = render_template("Received message '{message}' with ID {id}", &["hello", "42"]);
        assert_eq!(out, "Received message 'hello' with ID 42");
    }

    #[test]
    fn test_render_missing_args_left_verbatim() {
        assert_eq!(render_template("{a} and {b}", &["x"]), "x and {b}");
    }

    #[test]
    fn test_render_extra_args_ignored() {
        assert_eq!(render_template("only {one}", &["1", "2"]), "only 1");
    }

    #[test]
    fn test_render_unterminated_brace() {
        assert_eq!(render_template("open {brace", &["x"]), "open {brace");
    }

    #[test]
    fn test_render_empty_arg() {
        assert_eq!(render_template("'{message}'", &[""]), "''");
    }
}

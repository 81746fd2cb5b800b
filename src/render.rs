//! `{{name}}` token substitution for fragment templates.
//!
//! Rendering is a single left-to-right pass. A token whose name is in the
//! context is replaced by its value; any other token is copied through
//! verbatim so a missing optional variable never aborts a run. Substituted
//! values are never scanned again, so a value that happens to contain
//! `{{…}}` is emitted as-is.

use crate::resolve::VariableContext;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Render `template` against `ctx`.
pub fn render(template: &str, ctx: &VariableContext) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find(OPEN) {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + OPEN.len()..];

        let Some(close) = after_open.find(CLOSE) else {
            out.push_str(&rest[open..]);
            return out;
        };

        match ctx.get(&after_open[..close]) {
            Some(value) => {
                out.push_str(value);
                rest = &after_open[close + CLOSE.len()..];
            }
            None => {
                out.push_str(OPEN);
                rest = after_open;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Names of `{{…}}` tokens in `text`, in order of appearance, deduplicated.
///
/// Run over rendered output, this lists the variables a template expects but
/// the context did not provide.
pub fn unresolved_tokens(text: &str) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find(OPEN) {
        let after_open = &rest[open + OPEN.len()..];
        let Some(close) = after_open.find(CLOSE) else {
            break;
        };
        let name = &after_open[..close];
        if is_token_name(name) {
            if !names.contains(&name) {
                names.push(name);
            }
            rest = &after_open[close + CLOSE.len()..];
        } else {
            rest = after_open;
        }
    }
    names
}

fn is_token_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(pairs: &[(&str, &str)]) -> VariableContext {
        let mut c = VariableContext::new();
        for (k, v) in pairs {
            c.insert(k, *v);
        }
        c
    }

    #[test]
    fn replaces_every_occurrence() {
        let c = ctx(&[("root", "../")]);
        assert_eq!(
            render("<a href=\"{{root}}index.html\"><img src=\"{{root}}logo.svg\">", &c),
            "<a href=\"../index.html\"><img src=\"../logo.svg\">"
        );
    }

    #[test]
    fn multiple_variables() {
        let c = ctx(&[("huHref", "./"), ("enHref", "pages/en/index.html")]);
        assert_eq!(render("{{huHref}}|{{enHref}}", &c), "./|pages/en/index.html");
    }

    #[test]
    fn unknown_token_left_verbatim() {
        let c = ctx(&[("root", "")]);
        assert_eq!(
            render("{{root}}a {{missing}} b", &c),
            "a {{missing}} b"
        );
    }

    #[test]
    fn values_are_not_rescanned() {
        let c = ctx(&[("a", "{{b}}"), ("b", "oops")]);
        assert_eq!(render("{{a}}", &c), "{{b}}");
    }

    #[test]
    fn unterminated_token_is_copied() {
        let c = ctx(&[("root", "../")]);
        assert_eq!(render("x {{root", &c), "x {{root");
    }

    #[test]
    fn token_after_stray_open_is_still_replaced() {
        let c = ctx(&[("root", "../")]);
        assert_eq!(render("{{ {{root}}", &c), "{{ ../");
    }

    #[test]
    fn empty_context_is_identity() {
        let template = "<nav>{{root}}</nav>";
        assert_eq!(render(template, &VariableContext::new()), template);
    }

    #[test]
    fn lists_unresolved_tokens() {
        assert_eq!(
            unresolved_tokens("{{enHref}} {{ not a token }} {{enHref}} {{x_1}}"),
            vec!["enHref", "x_1"]
        );
        assert!(unresolved_tokens("plain text").is_empty());
    }
}

use simplec_syntax::error::{Diagnostic, DiagnosticKind};

/// A hint printed under a diagnostic: a headline and an optional example.
pub struct Suggestion {
    pub help: &'static str,
    pub example: Option<&'static str>,
}

impl Suggestion {
    fn new(help: &'static str, example: Option<&'static str>) -> Self {
        Self { help, example }
    }
}

pub fn suggestion_for(diag: &Diagnostic) -> Option<Suggestion> {
    let msg = diag.msg.as_str();
    match diag.kind {
        DiagnosticKind::Lex if msg.contains("Unterminated block comment") => Some(Suggestion::new(
            "Block comments must be closed with '*/' and do not nest.",
            None,
        )),
        DiagnosticKind::Lex if msg.contains("Unexpected character '!'") => Some(Suggestion::new(
            "SimpleC has no '!' operator; only '!=' is recognized.",
            Some("if (a != 0) { ... }"),
        )),
        DiagnosticKind::Lex if msg.contains("Unexpected character") => Some(Suggestion::new(
            "Only letters, digits, '_' and the SimpleC operators may appear outside comments.",
            None,
        )),
        DiagnosticKind::Lex if msg.contains("out of range") => Some(Suggestion::new(
            "Integer literals must fit in a signed 64-bit integer.",
            None,
        )),
        DiagnosticKind::Parse if msg.starts_with("expected ';'") => Some(Suggestion::new(
            "Did you forget a ';' at the end of the previous statement?",
            None,
        )),
        DiagnosticKind::Parse if msg.contains("unclosed '{'") => Some(Suggestion::new(
            "Every '{' needs a matching '}'.",
            None,
        )),
        DiagnosticKind::Parse if msg.starts_with("expected ')'") => Some(Suggestion::new(
            "Check if parentheses are balanced.",
            None,
        )),
        DiagnosticKind::Parse if msg.starts_with("expected '=' or '('") => Some(Suggestion::new(
            "A statement that starts with a name is an assignment or a call.",
            Some("x = x + 1;   f(x);"),
        )),
        DiagnosticKind::Parse if msg.contains("declaration is not allowed here") => Some(Suggestion::new(
            "Declarations may only appear as items of a '{ ... }' block.",
            Some("while (n > 0) { int t = n; n = n - 1; }"),
        )),
        DiagnosticKind::Semantic if msg.starts_with("redeclaration") => Some(Suggestion::new(
            "Each name may be declared once per scope; use a nested block to shadow it.",
            None,
        )),
        DiagnosticKind::Semantic if msg.contains("should not return a value") => Some(Suggestion::new(
            "Functions returning 'void' end with a bare 'return;'.",
            None,
        )),
        DiagnosticKind::Semantic if msg.contains("used as a value") => Some(Suggestion::new(
            "A 'void' function can only be called as a statement.",
            Some("log(x);"),
        )),
        DiagnosticKind::UnresolvedName if msg.starts_with("call to undeclared function") => Some(Suggestion::new(
            "Functions must be defined before the point where they are called.",
            None,
        )),
        DiagnosticKind::UnresolvedName => Some(Suggestion::new(
            "Did you forget to declare this variable?",
            Some("int count = 0;"),
        )),
        DiagnosticKind::DeadCode => Some(Suggestion::new(
            "This statement follows a 'return' on every path and never runs.",
            None,
        )),
        _ => None,
    }
}

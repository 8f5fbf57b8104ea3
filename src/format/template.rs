/// A value that can answer `%x` template directives.
pub trait Directives {
    /// Returns the replacement text for directive `ch`, or `None` when the
    /// directive is not recognized.
    fn directive(&self, ch: char) -> Option<String>;
}

/// Expands `%x` directives in `template` against `stats`.
///
/// `maxsize` counts a terminator the way a C buffer would, so at most
/// `maxsize - 1` bytes are produced. Once the budget is spent expansion stops
/// without error. An unrecognized directive emits just its character, so
/// `%%` becomes `%`.
pub fn expand<S>(template: &str, stats: &S, maxsize: usize) -> String
where
    S: Directives + ?Sized,
{
    let mut out = Budgeted::new(maxsize);
    let mut chars = template.chars();

    while let Some(ch) = chars.next() {
        if out.exhausted() {
            break;
        }
        if ch != '%' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some(directive) => match stats.directive(directive) {
                Some(text) => out.push_str(&text),
                None => out.push(directive),
            },
            None => out.push('%'),
        }
    }

    out.into_inner()
}

struct Budgeted {
    buf: String,
    remaining: usize,
}

impl Budgeted {
    fn new(maxsize: usize) -> Self {
        let remaining = maxsize.saturating_sub(1);
        Self {
            buf: String::with_capacity(remaining.min(256)),
            remaining,
        }
    }

    fn exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Appends `ch` if it fits; a character that does not fit exhausts the
    /// budget instead of being split.
    fn push(&mut self, ch: char) {
        let len = ch.len_utf8();
        if len > self.remaining {
            self.remaining = 0;
            return;
        }
        self.buf.push(ch);
        self.remaining -= len;
    }

    fn push_str(&mut self, s: &str) {
        for ch in s.chars() {
            if self.exhausted() {
                break;
            }
            self.push(ch);
        }
    }

    fn into_inner(self) -> String {
        self.buf
    }
}

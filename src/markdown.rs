use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

/// Renders text exactly as received: one unstyled span per line, markers and
/// all. Every user-typed or plain server string goes through here, never
/// through `render`.
pub fn literal(raw: &str) -> Text<'static> {
    let lines: Vec<Line<'static>> = raw
        .split('\n')
        .map(|line| Line::from(Span::raw(line.trim_end_matches('\r').to_string())))
        .collect();
    Text::from(lines)
}

/// Styles the markdown subset EVA answers use: headings, `- `/`* ` list
/// items, `**bold**`, `*italic*`/`_italic_` and backtick code spans. Inline
/// markers do not nest; an unclosed marker stays literal. Underscores inside
/// words stay literal.
pub fn render(md: &str) -> Text<'static> {
    let base = Style::default();
    let lines: Vec<Line<'static>> = md
        .split('\n')
        .map(|raw| styled_line(raw.trim_end_matches('\r'), base))
        .collect();
    Text::from(lines)
}

fn styled_line(raw: &str, base: Style) -> Line<'static> {
    if let Some(heading) = raw
        .strip_prefix("### ")
        .or_else(|| raw.strip_prefix("## "))
        .or_else(|| raw.strip_prefix("# "))
    {
        let style = base.fg(Color::Cyan).add_modifier(Modifier::BOLD);
        return Line::from(Span::styled(heading.to_string(), style));
    }
    if let Some(item) = raw.strip_prefix("- ").or_else(|| raw.strip_prefix("* ")) {
        let mut spans = vec![Span::styled("  • ".to_string(), base.fg(Color::DarkGray))];
        spans.extend(inline_spans(item, base));
        return Line::from(spans);
    }
    Line::from(inline_spans(raw, base))
}

fn inline_spans(text: &str, base: Style) -> Vec<Span<'static>> {
    let chars: Vec<char> = text.chars().collect();
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut plain = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '*' && chars.get(i + 1) == Some(&'*') {
            if let Some(end) = find_double_star(&chars, i + 2) {
                flush(&mut spans, &mut plain, base);
                let inner: String = chars[i + 2..end].iter().collect();
                spans.push(Span::styled(inner, base.add_modifier(Modifier::BOLD)));
                i = end + 2;
                continue;
            }
        } else if c == '*' {
            if let Some(end) = find_char(&chars, i + 1, '*')
                && end > i + 1
            {
                flush(&mut spans, &mut plain, base);
                let inner: String = chars[i + 1..end].iter().collect();
                spans.push(Span::styled(inner, base.add_modifier(Modifier::ITALIC)));
                i = end + 1;
                continue;
            }
        } else if c == '_' {
            if opens_underscore(&chars, i)
                && let Some(end) = find_underscore_close(&chars, i + 1)
            {
                flush(&mut spans, &mut plain, base);
                let inner: String = chars[i + 1..end].iter().collect();
                spans.push(Span::styled(inner, base.add_modifier(Modifier::ITALIC)));
                i = end + 1;
                continue;
            }
        } else if c == '`' {
            if let Some(end) = find_char(&chars, i + 1, '`')
                && end > i + 1
            {
                flush(&mut spans, &mut plain, base);
                let inner: String = chars[i + 1..end].iter().collect();
                spans.push(Span::styled(inner, base.fg(Color::Yellow)));
                i = end + 1;
                continue;
            }
        }
        plain.push(c);
        i += 1;
    }

    flush(&mut spans, &mut plain, base);
    if spans.is_empty() {
        spans.push(Span::styled(String::new(), base));
    }
    spans
}

fn flush(spans: &mut Vec<Span<'static>>, plain: &mut String, base: Style) {
    if !plain.is_empty() {
        spans.push(Span::styled(std::mem::take(plain), base));
    }
}

fn find_char(chars: &[char], from: usize, needle: char) -> Option<usize> {
    (from..chars.len()).find(|&idx| chars[idx] == needle)
}

fn find_double_star(chars: &[char], from: usize) -> Option<usize> {
    let mut idx = from;
    while idx + 1 < chars.len() {
        if chars[idx] == '*' && chars[idx + 1] == '*' {
            // Empty bold ("****") stays literal.
            if idx > from {
                return Some(idx);
            }
            return None;
        }
        idx += 1;
    }
    None
}

fn opens_underscore(chars: &[char], at: usize) -> bool {
    let boundary_before = at == 0 || chars[at - 1].is_whitespace();
    let opens_word = chars
        .get(at + 1)
        .is_some_and(|c| !c.is_whitespace() && *c != '_');
    boundary_before && opens_word
}

fn find_underscore_close(chars: &[char], from: usize) -> Option<usize> {
    (from..chars.len()).find(|&idx| {
        chars[idx] == '_'
            && idx > from
            && chars.get(idx + 1).is_none_or(|c| !c.is_alphanumeric())
    })
}

use super::{IoctlItem, OutputFormatter};
use errexplain::Explanation;
use std::io::Write;

const CONTINUATION_INDENT: &str = "    ";

pub struct PlainFormatter {
    width: usize,
}

impl PlainFormatter {
    pub fn new(width: usize) -> Self {
        PlainFormatter { width }
    }
}

/// Break `text` at spaces so no line is wider than `width`, where possible.
///
/// Continuation lines carry a hanging indent. Words longer than the width
/// are left whole. A width of zero disables wrapping.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    if width == 0 || text.len() <= width {
        return vec![text.to_string()];
    }
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split(' ') {
        let limit = if lines.is_empty() {
            width
        } else {
            width.saturating_sub(CONTINUATION_INDENT.len())
        };
        if !line.is_empty() && line.len() + 1 + word.len() > limit {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    lines.push(line);
    lines
        .into_iter()
        .enumerate()
        .map(|(i, l)| if i == 0 { l } else { format!("{CONTINUATION_INDENT}{l}") })
        .collect()
}

impl OutputFormatter for PlainFormatter {
    fn begin_document(&mut self, _w: &mut dyn Write) -> std::io::Result<()> {
        Ok(())
    }

    fn end_document(&mut self, _w: &mut dyn Write) -> std::io::Result<()> {
        Ok(())
    }

    fn explanation(&mut self, w: &mut dyn Write, explanation: &Explanation) -> std::io::Result<()> {
        for line in wrap(&explanation.message, self.width) {
            writeln!(w, "{line}")?;
        }
        Ok(())
    }

    fn begin_ioctl_list(&mut self, w: &mut dyn Write, title: &str) -> std::io::Result<()> {
        writeln!(w, "\n{title}:")?;
        writeln!(w, "{}", "-".repeat(title.len() + 1))
    }

    fn ioctl_item(&mut self, w: &mut dyn Write, item: &IoctlItem) -> std::io::Result<()> {
        if item.data_type.is_empty() {
            writeln!(w, "  {:<24} {:#010X}", item.name, item.number)
        } else {
            writeln!(w, "  {:<24} {:#010X}  {}", item.name, item.number, item.data_type)
        }
    }

    fn end_ioctl_list(&mut self, _w: &mut dyn Write) -> std::io::Result<()> {
        Ok(())
    }

    fn total_ioctls(&mut self, w: &mut dyn Write, count: usize) -> std::io::Result<()> {
        writeln!(w, "\nTotal requests known: {count}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_disabled() {
        let text = "a ".repeat(100);
        assert_eq!(wrap(&text, 0), vec![text.clone()]);
    }

    #[test]
    fn test_wrap_hanging_indent() {
        let text = "open(pathname = \"/x\", flags = O_RDONLY) failed, the named file does not exist";
        let lines = wrap(text, 30);
        assert!(lines.len() > 1);
        assert!(lines[0].len() <= 30);
        assert!(!lines[0].starts_with(' '));
        for line in &lines[1..] {
            assert!(line.starts_with(CONTINUATION_INDENT));
            assert!(line.len() <= 30);
        }
        let rejoined: Vec<&str> = lines.iter().map(|l| l.trim_start()).collect();
        assert_eq!(
            rejoined.join(" "),
            "open(pathname = \"/x\", flags = O_RDONLY) failed, the named file does not exist"
        );
    }

    #[test]
    fn test_long_word_kept_whole() {
        let word = "x".repeat(50);
        let lines = wrap(&format!("a {word} b"), 20);
        assert!(lines.iter().any(|l| l.trim_start() == word));
    }

    #[test]
    fn test_explanation_written() {
        let explanation = errexplain::explain::Explanation::new(
            libc::EBADF,
            &errexplain::Call::Close { fildes: -1 },
            errexplain::explain::DEFAULT_BUFFER_SIZE,
        );
        let mut out = Vec::new();
        PlainFormatter::new(0).explanation(&mut out, &explanation).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, format!("{}\n", explanation.message));
        assert!(text.starts_with("close(fildes = -1) failed, "));
    }
}

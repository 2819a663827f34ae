use std::fmt;

/// A flat, pinned requirements list in pip's `requirements.txt` format.
///
/// Lines are kept verbatim (minus surrounding whitespace and blank lines) so
/// option lines such as `-i https://pypi.org/simple` reach the installer
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirements {
    lines: Vec<String>,
}

impl Requirements {
    pub fn parse(text: &str) -> Self {
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(ToOwned::to_owned)
            .collect();
        Self { lines }
    }

    pub fn from_lines(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Requirement lines only, skipping pip options and comments.
    pub fn packages(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .map(String::as_str)
            .filter(|l| !l.starts_with('-') && !l.starts_with('#'))
    }

    /// Distribution name of each requirement line.
    pub fn package_names(&self) -> impl Iterator<Item = &str> {
        self.packages().map(|line| {
            let end = line
                .find(|c: char| matches!(c, '[' | '=' | '<' | '>' | '!' | '~' | ';' | ' ' | '@'))
                .unwrap_or(line.len());
            &line[..end]
        })
    }

    pub fn package_count(&self) -> usize {
        self.packages().count()
    }

    pub fn is_empty(&self) -> bool {
        self.package_count() == 0
    }

    /// File contents for `pip install --requirement`.
    pub fn to_file_contents(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

impl fmt::Display for Requirements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_file_contents())
    }
}

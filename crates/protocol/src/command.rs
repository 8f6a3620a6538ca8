/// A parsed `"<name>:<p1>:<p2>:..."` message, the one grammar shared by the
/// firmware link and the operator link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: String,
    params: Vec<String>,
}

impl Command {
    /// Parses a raw line. A command is valid if at least one `:`-delimited
    /// segment (including the name itself) is non-empty; an all-empty or
    /// all-colon line (`""`, `":"`, `"::"`) is rejected. The first segment
    /// becomes the name, even if it happens to be empty — callers match on
    /// `name()` so an empty name simply never matches anything and falls
    /// through to "unsupported command" logging, same as any other unknown
    /// name.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let mut segments = line.split(':');
        let name = segments.next()?;
        let params: Vec<String> = segments.map(str::to_owned).collect();

        let any_non_empty = !name.is_empty() || params.iter().any(|p| !p.is_empty());
        if !any_non_empty {
            return None;
        }

        Some(Self {
            name: name.to_owned(),
            params,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    #[must_use]
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn param_f32(&self, index: usize) -> Option<f32> {
        self.param(index)?.parse().ok()
    }

    #[must_use]
    pub fn param_i32(&self, index: usize) -> Option<i32> {
        self.param(index)?.parse().ok()
    }

    /// Whether `run-<name>` matching should fire, returning `<name>`.
    #[must_use]
    pub fn run_suffix(&self) -> Option<&str> {
        self.name.strip_prefix("run-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_and_params() {
        let cmd = Command::parse("target-vector:1.0:0.5:-0.2").unwrap();
        assert_eq!(cmd.name(), "target-vector");
        assert_eq!(cmd.param_f32(0), Some(1.0));
        assert_eq!(cmd.param_f32(1), Some(0.5));
        assert_eq!(cmd.param_f32(2), Some(-0.2));
    }

    #[test]
    fn parses_bare_name_without_params() {
        let cmd = Command::parse("stop").unwrap();
        assert_eq!(cmd.name(), "stop");
        assert!(cmd.params().is_empty());
    }

    #[test]
    fn rejects_empty_line() {
        assert!(Command::parse("").is_none());
    }

    #[test]
    fn rejects_all_colon_line() {
        assert!(Command::parse("::").is_none());
    }

    #[test]
    fn accepts_leading_empty_segment_with_later_content() {
        let cmd = Command::parse(":5").unwrap();
        assert_eq!(cmd.name(), "");
        assert_eq!(cmd.param(0), Some("5"));
    }

    #[test]
    fn run_suffix_extracts_substate_name() {
        let cmd = Command::parse("run-aim").unwrap();
        assert_eq!(cmd.run_suffix(), Some("aim"));
        assert_eq!(Command::parse("stop").unwrap().run_suffix(), None);
    }
}

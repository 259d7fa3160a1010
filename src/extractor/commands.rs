use tracing::debug;

use crate::models::MediaKind;

/// Abstract extraction tool invocation; the binary itself is owned by the extractor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorCommand {
    pub args: Vec<String>,
    pub description: String,
}

impl ExtractorCommand {
    /// Create a new extraction command
    pub fn new<S: Into<String>>(description: S) -> Self {
        Self {
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Emit a single JSON document describing the resource
    pub fn dump_json(self) -> Self {
        self.arg("--dump-json")
    }

    pub fn no_warnings(self) -> Self {
        self.arg("--no-warnings")
    }

    pub fn no_check_certificate(self) -> Self {
        self.arg("--no-check-certificate")
    }

    /// Write media to standard output instead of a file
    pub fn output_to_stdout(self) -> Self {
        self.arg("-o").arg("-")
    }

    /// Set format selector
    pub fn format<S: Into<String>>(self, selector: S) -> Self {
        self.arg("-f").arg(selector)
    }

    /// Extract audio only
    pub fn extract_audio(self) -> Self {
        self.arg("-x")
    }

    pub fn audio_format<S: Into<String>>(self, format: S) -> Self {
        self.arg("--audio-format").arg(format)
    }

    /// 0 is the best VBR quality
    pub fn audio_quality(self, quality: u8) -> Self {
        self.arg("--audio-quality").arg(quality.to_string())
    }

    /// Terminate option parsing and append the resource locator
    pub fn url<S: Into<String>>(self, url: S) -> Self {
        self.arg("--").arg(url)
    }
}

/// Builder for the invocations the relay performs
#[derive(Debug, Clone, Default)]
pub struct ExtractorCommandBuilder {
    extra_args: Vec<String>,
}

impl ExtractorCommandBuilder {
    /// Create a new command builder; `extra_args` go on every invocation
    pub fn new(extra_args: Vec<String>) -> Self {
        Self { extra_args }
    }

    /// Build metadata dump command
    pub fn metadata(&self, url: &str) -> ExtractorCommand {
        ExtractorCommand::new("Metadata extraction")
            .no_warnings()
            .no_check_certificate()
            .args(self.extra_args.iter().cloned())
            .dump_json()
            .url(url)
    }

    /// Build stdout streaming command for the requested media kind
    pub fn stream(&self, url: &str, kind: MediaKind) -> ExtractorCommand {
        let cmd = ExtractorCommand::new(match kind {
            MediaKind::Audio => "Audio stream",
            MediaKind::Video => "Video stream",
        })
        .no_warnings()
        .no_check_certificate()
        .output_to_stdout()
        .args(self.extra_args.iter().cloned());

        let cmd = match kind {
            MediaKind::Audio => cmd.extract_audio().audio_format("mp3").audio_quality(0),
            MediaKind::Video => cmd.format("best"),
        };

        debug!("Built {} command: {:?}", cmd.description, cmd.args);
        cmd.url(url)
    }

    /// Build version check command
    pub fn version_check(&self) -> ExtractorCommand {
        ExtractorCommand::new("Version check").arg("--version")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_metadata_command() {
        let cmd = ExtractorCommandBuilder::default().metadata("https://example.com/watch?v=1");
        assert_eq!(
            cmd.args,
            strings(&[
                "--no-warnings",
                "--no-check-certificate",
                "--dump-json",
                "--",
                "https://example.com/watch?v=1",
            ])
        );
    }

    #[test]
    fn test_audio_stream_command() {
        let cmd = ExtractorCommandBuilder::default().stream("https://example.com/a", MediaKind::Audio);
        assert_eq!(
            cmd.args,
            strings(&[
                "--no-warnings",
                "--no-check-certificate",
                "-o",
                "-",
                "-x",
                "--audio-format",
                "mp3",
                "--audio-quality",
                "0",
                "--",
                "https://example.com/a",
            ])
        );
    }

    #[test]
    fn test_video_stream_command() {
        let cmd = ExtractorCommandBuilder::default().stream("https://example.com/v", MediaKind::Video);
        assert_eq!(
            cmd.args,
            strings(&[
                "--no-warnings",
                "--no-check-certificate",
                "-o",
                "-",
                "-f",
                "best",
                "--",
                "https://example.com/v",
            ])
        );
        assert_eq!(cmd.description, "Video stream");
    }

    #[test]
    fn test_extra_args_precede_mode_flags() {
        let builder = ExtractorCommandBuilder::new(strings(&["--proxy", "socks5://127.0.0.1:1080"]));

        let cmd = builder.stream("https://example.com/v", MediaKind::Video);
        let proxy = cmd.args.iter().position(|a| a == "--proxy").unwrap();
        let format = cmd.args.iter().position(|a| a == "-f").unwrap();
        assert!(proxy < format);

        let cmd = builder.metadata("https://example.com/v");
        assert_eq!(cmd.args[2..4], strings(&["--proxy", "socks5://127.0.0.1:1080"]));
        let proxy = cmd.args.iter().position(|a| a == "--proxy").unwrap();
        let dump = cmd.args.iter().position(|a| a == "--dump-json").unwrap();
        assert!(proxy < dump);
    }

    #[test]
    fn test_locator_is_last_even_when_it_looks_like_a_flag() {
        let cmd = ExtractorCommandBuilder::default().stream("--exec=rm", MediaKind::Audio);
        let len = cmd.args.len();
        assert_eq!(cmd.args[len - 2], "--");
        assert_eq!(cmd.args[len - 1], "--exec=rm");
    }
}

//! Content expansion pipeline
//!
//! A body is rewritten in four stages, always in this order:
//!
//! 1. nested command references: a line `/name key="value" ...`
//! 2. parameters: `${name}` or `$name`
//! 3. inline commands: `` !`command` ``
//! 4. file references: `@path`
//!
//! The body is held as a list of segments. Text a stage produces is marked
//! expanded and no later stage looks at it, so a parameter value
//! containing `` !`rm -rf /` `` is inserted literally and never run.
//! Inline command tokens are set aside before parameter substitution, so
//! `$HOME` inside one reaches the shell untouched.
//!
//! A nested reference only gets parameter substitution. Its result is final.
//! A `/name` line that does not resolve stays ordinary text for the later
//! stages.

use crate::core::fragment::{ExpandedFragment, Fragment};
use crate::core::params::Params;
use crate::core::warning::Warning;
use crate::error::{ContextError, Result};
use crate::io::include::{language_tag, render_reference_block, resolve_reference};
use crate::io::shell::CommandRunner;
use log::debug;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')'];

/// Per-body inputs to expansion
#[derive(Debug, Clone)]
pub struct ExpansionContext {
    pub params: Params,
    /// Directory commands run in and relative `@path` references resolve against
    pub working_dir: PathBuf,
}

impl ExpansionContext {
    pub fn new(params: Params, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            params,
            working_dir: working_dir.into(),
        }
    }
}

/// Where `/name` references are looked up
pub trait FragmentSource {
    fn lookup(&self, name: &str) -> Option<&Fragment>;
}

impl FragmentSource for BTreeMap<String, Fragment> {
    fn lookup(&self, name: &str) -> Option<&Fragment> {
        self.get(name)
    }
}

/// Result of expanding one body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    pub content: String,
    pub warnings: Vec<Warning>,
    /// Command fragments inlined by `/name`, in first-use order
    pub referenced: Vec<String>,
}

/// Result of expanding one fragment
#[derive(Debug, Clone)]
pub struct FragmentExpansion {
    pub fragment: ExpandedFragment,
    pub warnings: Vec<Warning>,
    pub referenced: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Unexpanded(String),
    /// A whole `` !`command` `` token waiting for the command stage
    Command(String),
    Expanded(String),
}

impl Segment {
    fn text(&self) -> &str {
        match self {
            Self::Unexpanded(text) | Self::Command(text) | Self::Expanded(text) => text,
        }
    }
}

/// Append `segment`, joining it onto a preceding unexpanded run
fn push_segment(out: &mut Vec<Segment>, segment: Segment) {
    match (out.last_mut(), segment) {
        (_, Segment::Unexpanded(text)) if text.is_empty() => {}
        (Some(Segment::Unexpanded(last)), Segment::Unexpanded(text)) => last.push_str(&text),
        (_, segment) => out.push(segment),
    }
}

fn push_unexpanded(out: &mut Vec<Segment>, text: &str) {
    push_segment(out, Segment::Unexpanded(text.to_string()));
}

/// Replace every match of `re` inside unexpanded segments with the segment
/// the closure returns
fn rewrite<F>(segments: Vec<Segment>, re: &Regex, mut replace: F) -> Result<Vec<Segment>>
where
    F: FnMut(&Captures<'_>) -> Result<Segment>,
{
    let mut out = Vec::with_capacity(segments.len());
    for segment in segments {
        let text = match segment {
            Segment::Unexpanded(text) => text,
            other => {
                out.push(other);
                continue;
            }
        };
        let mut last = 0;
        for caps in re.captures_iter(&text) {
            let Some(whole) = caps.get(0) else { continue };
            push_unexpanded(&mut out, &text[last..whole.start()]);
            push_segment(&mut out, replace(&caps)?);
            last = whole.end();
        }
        push_unexpanded(&mut out, &text[last..]);
    }
    Ok(out)
}

/// Strip a single trailing newline
fn chomp(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    text
}

/// Expands fragment bodies
pub struct Expander<'a> {
    commands: &'a dyn FragmentSource,
    runner: &'a dyn CommandRunner,
    reference_re: Regex,
    param_re: Regex,
    command_re: Regex,
}

impl<'a> Expander<'a> {
    pub fn new(commands: &'a dyn FragmentSource, runner: &'a dyn CommandRunner) -> Result<Self> {
        Ok(Self {
            commands,
            runner,
            reference_re: Regex::new(
                r"(?m)^[ \t]*/([A-Za-z0-9_][A-Za-z0-9_.\-]*)(?:[ \t]+([^\n]*?))?[ \t]*\r?$",
            )?,
            param_re: Regex::new(r"\$\{([A-Za-z0-9_]+)\}|\$([A-Za-z0-9_]+)")?,
            command_re: Regex::new(r"!`([^`]*)`")?,
        })
    }

    /// Run all four stages over `body`
    ///
    /// Only an interrupted shell command is an error; everything else that
    /// goes wrong leaves the token verbatim and adds a warning.
    pub fn expand(&self, ctx: &ExpansionContext, body: &str) -> Result<Expansion> {
        let mut warnings = Vec::new();
        let mut referenced = Vec::new();

        let segments = vec![Segment::Unexpanded(body.to_string())];
        let segments = self.expand_references(ctx, segments, &mut warnings, &mut referenced)?;
        let segments = rewrite(segments, &self.command_re, |caps| {
            Ok(Segment::Command(caps[0].to_string()))
        })?;
        let segments = self.expand_parameters(&ctx.params, segments, &mut warnings)?;
        let segments = self.expand_commands(ctx, segments, &mut warnings)?;
        let segments = self.expand_file_references(ctx, segments, &mut warnings);

        let content = segments.iter().map(Segment::text).collect();
        Ok(Expansion {
            content,
            warnings,
            referenced,
        })
    }

    /// Expand a fragment's body, honouring `expand: false`
    pub fn expand_fragment(
        &self,
        ctx: &ExpansionContext,
        fragment: Fragment,
    ) -> Result<FragmentExpansion> {
        if !fragment.front_matter().expand_enabled() {
            debug!("Expansion disabled for {}", fragment.path().display());
            let content = fragment.body().to_string();
            return Ok(FragmentExpansion {
                fragment: ExpandedFragment::new(fragment, content),
                warnings: Vec::new(),
                referenced: Vec::new(),
            });
        }

        debug!("Expanding {}", fragment.path().display());
        let expansion = self.expand(ctx, fragment.body())?;
        Ok(FragmentExpansion {
            fragment: ExpandedFragment::new(fragment, expansion.content),
            warnings: expansion.warnings,
            referenced: expansion.referenced,
        })
    }

    /// Parameter substitution only, on text that gets no other stage
    pub fn substitute_parameters(
        &self,
        text: &str,
        params: &Params,
        warnings: &mut Vec<Warning>,
    ) -> String {
        self.param_re
            .replace_all(text, |caps: &Captures<'_>| {
                resolve_parameter(caps, params, warnings)
            })
            .into_owned()
    }

    fn expand_references(
        &self,
        ctx: &ExpansionContext,
        segments: Vec<Segment>,
        warnings: &mut Vec<Warning>,
        referenced: &mut Vec<String>,
    ) -> Result<Vec<Segment>> {
        rewrite(segments, &self.reference_re, |caps| {
            let name = &caps[1];
            let Some(command) = self.commands.lookup(name) else {
                warnings.push(Warning::FragmentNotFound {
                    name: name.to_string(),
                });
                return Ok(Segment::Unexpanded(caps[0].to_string()));
            };

            let raw_args = caps.get(2).map_or("", |m| m.as_str());
            let inline = match Params::parse_arguments(raw_args) {
                Ok(inline) => inline,
                Err(err) => {
                    warnings.push(Warning::InvalidArguments {
                        name: name.to_string(),
                        reason: err.to_string(),
                    });
                    return Ok(Segment::Unexpanded(caps[0].to_string()));
                }
            };

            if !referenced.iter().any(|seen| seen == name) {
                referenced.push(name.to_string());
            }
            debug!("Inlining command /{}", name);

            let body = command.body();
            let body = body.strip_suffix('\n').unwrap_or(body);
            if !command.front_matter().expand_enabled() {
                return Ok(Segment::Expanded(body.to_string()));
            }
            let params = ctx.params.merged(&inline);
            Ok(Segment::Expanded(
                self.substitute_parameters(body, &params, warnings),
            ))
        })
    }

    fn expand_parameters(
        &self,
        params: &Params,
        segments: Vec<Segment>,
        warnings: &mut Vec<Warning>,
    ) -> Result<Vec<Segment>> {
        rewrite(segments, &self.param_re, |caps| {
            Ok(Segment::Expanded(resolve_parameter(caps, params, warnings)))
        })
    }

    fn expand_commands(
        &self,
        ctx: &ExpansionContext,
        segments: Vec<Segment>,
        warnings: &mut Vec<Warning>,
    ) -> Result<Vec<Segment>> {
        segments
            .into_iter()
            .map(|segment| match segment {
                Segment::Command(token) => Ok(Segment::Expanded(
                    self.run_command(ctx, &token, warnings)?,
                )),
                other => Ok(other),
            })
            .collect()
    }

    /// Output of the command inside `token`, or `token` itself on failure
    fn run_command(
        &self,
        ctx: &ExpansionContext,
        token: &str,
        warnings: &mut Vec<Warning>,
    ) -> Result<String> {
        let command = token
            .strip_prefix("!`")
            .and_then(|rest| rest.strip_suffix('`'))
            .unwrap_or(token);
        debug!("Running `{}` in {}", command, ctx.working_dir.display());
        match self.runner.run(command, &ctx.working_dir) {
            Ok(output) if output.succeeded() => Ok(chomp(output.stdout)),
            Ok(output) if output.interrupted() => Err(ContextError::interrupted(command)),
            Ok(output) => {
                warnings.push(Warning::CommandFailed {
                    command: command.to_string(),
                    status: output.status_text(),
                    stderr: output.stderr.trim_end().to_string(),
                });
                Ok(token.to_string())
            }
            Err(err) => {
                warnings.push(Warning::CommandFailed {
                    command: command.to_string(),
                    status: format!("failed to start: {}", err),
                    stderr: String::new(),
                });
                Ok(token.to_string())
            }
        }
    }

    /// `@path` must start the body or follow whitespace, which may sit in a
    /// neighbouring segment, so this stage scans by hand
    fn expand_file_references(
        &self,
        ctx: &ExpansionContext,
        segments: Vec<Segment>,
        warnings: &mut Vec<Warning>,
    ) -> Vec<Segment> {
        let mut out = Vec::with_capacity(segments.len());
        let mut prev: Option<char> = None;

        for segment in segments {
            let last_char = segment.text().chars().last();
            match segment {
                Segment::Unexpanded(text) => {
                    self.scan_file_references(ctx, &text, prev, &mut out, warnings)
                }
                other => out.push(other),
            }
            prev = last_char.or(prev);
        }
        out
    }

    fn scan_file_references(
        &self,
        ctx: &ExpansionContext,
        text: &str,
        mut prev: Option<char>,
        out: &mut Vec<Segment>,
        warnings: &mut Vec<Warning>,
    ) {
        let mut last = 0;
        let mut chars = text.char_indices().peekable();

        while let Some((at, c)) = chars.next() {
            let at_boundary = prev.map_or(true, char::is_whitespace);
            prev = Some(c);
            if c != '@' || !at_boundary {
                continue;
            }
            let Some((reference, len)) = scan_reference(&text[at + 1..]) else {
                continue;
            };
            let end = at + 1 + len;

            push_unexpanded(out, &text[last..at]);
            out.push(Segment::Expanded(self.include_file(
                ctx,
                &reference,
                &text[at..end],
                warnings,
            )));
            last = end;

            while chars.peek().is_some_and(|&(index, _)| index < end) {
                chars.next();
            }
            prev = text[..end].chars().last();
        }
        push_unexpanded(out, &text[last..]);
    }

    fn include_file(
        &self,
        ctx: &ExpansionContext,
        reference: &str,
        raw: &str,
        warnings: &mut Vec<Warning>,
    ) -> String {
        let path = resolve_reference(reference, &ctx.working_dir);
        match fs::read_to_string(&path) {
            Ok(content) => {
                debug!("Including {}", path.display());
                render_reference_block(reference, &language_tag(&path), &content)
            }
            Err(err) => {
                warnings.push(Warning::FileReferenceFailed {
                    path: reference.to_string(),
                    reason: err.to_string(),
                });
                raw.to_string()
            }
        }
    }
}

fn resolve_parameter(caps: &Captures<'_>, params: &Params, warnings: &mut Vec<Warning>) -> String {
    let Some(name) = caps.get(1).or_else(|| caps.get(2)) else {
        return caps[0].to_string();
    };
    match params.get(name.as_str()) {
        Some(value) => value.to_string(),
        None => {
            warnings.push(Warning::UnresolvedParameter {
                name: name.as_str().to_string(),
            });
            caps[0].to_string()
        }
    }
}

/// Read a path after `@`: up to unescaped whitespace, minus trailing
/// sentence punctuation. Returns the unescaped path and its raw length.
fn scan_reference(rest: &str) -> Option<(String, usize)> {
    let mut end = 0;
    let mut chars = rest.char_indices();
    while let Some((index, c)) = chars.next() {
        if c == '\\' && rest[index + 1..].starts_with(' ') {
            chars.next();
            end = index + 2;
            continue;
        }
        if c.is_whitespace() {
            break;
        }
        end = index + c.len_utf8();
    }

    let raw = rest[..end].trim_end_matches(TRAILING_PUNCTUATION);
    if raw.is_empty() {
        return None;
    }
    Some((raw.replace("\\ ", " "), raw.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::front_matter::FrontMatter;
    use crate::core::fragment::FragmentKind;
    use crate::core::value::FrontMatterValue;
    use crate::io::shell::CommandOutput;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::io;
    use std::path::Path;
    use tempfile::TempDir;

    /// Answers from a fixed table and records what it was asked to run
    #[derive(Default)]
    struct FakeRunner {
        outputs: BTreeMap<String, CommandOutput>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeRunner {
        fn with(mut self, command: &str, output: CommandOutput) -> Self {
            self.outputs.insert(command.to_string(), output);
            self
        }
    }

    impl CommandRunner for FakeRunner {
        fn run(&self, command: &str, _working_dir: &Path) -> io::Result<CommandOutput> {
            self.calls.borrow_mut().push(command.to_string());
            self.outputs
                .get(command)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such command"))
        }
    }

    fn command(name: &str, fm: FrontMatter, body: &str) -> (String, Fragment) {
        let path = format!("/repo/.agents/commands/{}.md", name);
        (
            name.to_string(),
            Fragment::new(path, FragmentKind::Command, fm, body),
        )
    }

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs.iter().copied().collect()
    }

    fn expand_with(
        commands: &BTreeMap<String, Fragment>,
        runner: &FakeRunner,
        ctx: &ExpansionContext,
        body: &str,
    ) -> Expansion {
        Expander::new(commands, runner)
            .unwrap()
            .expand(ctx, body)
            .unwrap()
    }

    fn expand(body: &str, pairs: &[(&str, &str)]) -> Expansion {
        let ctx = ExpansionContext::new(params(pairs), "/nonexistent");
        expand_with(&BTreeMap::new(), &FakeRunner::default(), &ctx, body)
    }

    #[test]
    fn test_plain_text_is_identity() {
        let body = "# Title\n\nNo tokens here, just $ and @ and ! alone.\n";
        let result = expand(body, &[]);
        assert_eq!(result.content, body);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_parameter_substitution() {
        let result = expand("Hello ${name}, from $team!", &[("name", "Alice"), ("team", "core")]);
        assert_eq!(result.content, "Hello Alice, from core!");
    }

    #[test]
    fn test_expansion_is_idempotent_on_resolved_output() {
        let first = expand("Fix issue ${issue} in ${repo}", &[("issue", "42"), ("repo", "api")]);
        let second = expand(&first.content, &[("issue", "42"), ("repo", "api")]);
        assert_eq!(first.content, second.content);
    }

    #[test]
    fn test_unresolved_parameter_is_left_verbatim() {
        let result = expand("Fix ${issue} now", &[]);
        assert_eq!(result.content, "Fix ${issue} now");
        assert_eq!(
            result.warnings,
            vec![Warning::UnresolvedParameter {
                name: "issue".into()
            }]
        );
    }

    #[test]
    fn test_inline_command_output() {
        let runner = FakeRunner::default().with("echo 42", CommandOutput::success("42\n"));
        let ctx = ExpansionContext::new(Params::new(), "/repo");
        let result = expand_with(&BTreeMap::new(), &runner, &ctx, "Value: !`echo 42`");
        assert_eq!(result.content, "Value: 42");
        assert_eq!(*runner.calls.borrow(), vec!["echo 42".to_string()]);
    }

    #[test]
    fn test_failed_command_is_left_verbatim() {
        let runner = FakeRunner::default().with("false", CommandOutput::failure(1, "nope\n"));
        let ctx = ExpansionContext::new(Params::new(), "/repo");
        let result = expand_with(&BTreeMap::new(), &runner, &ctx, "A !`false` B !`missing`");
        assert_eq!(result.content, "A !`false` B !`missing`");
        assert_eq!(result.warnings.len(), 2);
        assert_eq!(
            result.warnings[0],
            Warning::CommandFailed {
                command: "false".into(),
                status: "exit status 1".into(),
                stderr: "nope".into(),
            }
        );
    }

    #[test]
    fn test_interrupted_command_is_fatal() {
        let runner = FakeRunner::default().with("sleep 100", CommandOutput::killed(2));
        let commands = BTreeMap::new();
        let ctx = ExpansionContext::new(Params::new(), "/repo");
        let result = Expander::new(&commands, &runner)
            .unwrap()
            .expand(&ctx, "!`sleep 100`");
        assert!(matches!(result, Err(ContextError::Interrupted { .. })));
    }

    #[test]
    fn test_command_text_is_not_parameter_substituted() {
        let runner = FakeRunner::default()
            .with("echo ${x}", CommandOutput::success("from shell\n"))
            .with("echo $HOME", CommandOutput::success("/home/dev\n"))
            .with("echo '${dynamic}'", CommandOutput::success("${dynamic}\n"));
        let ctx = ExpansionContext::new(params(&[("x", "hello"), ("dynamic", "value")]), "/repo");
        let result = expand_with(
            &BTreeMap::new(),
            &runner,
            &ctx,
            "A: !`echo ${x}` ${x}\nB: !`echo $HOME`\nC: !`echo '${dynamic}'`",
        );
        assert_eq!(
            result.content,
            "A: from shell hello\nB: /home/dev\nC: ${dynamic}"
        );
        assert!(result.warnings.is_empty());
        assert_eq!(
            *runner.calls.borrow(),
            vec!["echo ${x}", "echo $HOME", "echo '${dynamic}'"]
        );
    }

    #[test]
    fn test_parameter_values_are_never_rescanned() {
        let runner = FakeRunner::default();
        let ctx = ExpansionContext::new(
            params(&[("payload", "!`touch pwned` @/etc/passwd ${other}")]),
            "/repo",
        );
        let result = expand_with(&BTreeMap::new(), &runner, &ctx, "Data: ${payload}");
        assert_eq!(result.content, "Data: !`touch pwned` @/etc/passwd ${other}");
        assert!(runner.calls.borrow().is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_command_output_is_never_rescanned() {
        let runner = FakeRunner::default().with("cat x", CommandOutput::success("${secret} @main.go"));
        let ctx = ExpansionContext::new(params(&[("secret", "s3cr3t")]), "/repo");
        let result = expand_with(&BTreeMap::new(), &runner, &ctx, "!`cat x`");
        assert_eq!(result.content, "${secret} @main.go");
    }

    #[test]
    fn test_file_reference_inclusion() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.go"), "package main\n").unwrap();
        let ctx = ExpansionContext::new(Params::new(), dir.path());
        let result = expand_with(
            &BTreeMap::new(),
            &FakeRunner::default(),
            &ctx,
            "Review @main.go.",
        );
        assert_eq!(
            result.content,
            "Review \n\nFile: main.go\n```go\npackage main\n```\n\n."
        );
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_file_reference_escaped_space() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("my notes.txt"), "todo").unwrap();
        let ctx = ExpansionContext::new(Params::new(), dir.path());
        let result = expand_with(
            &BTreeMap::new(),
            &FakeRunner::default(),
            &ctx,
            "@my\\ notes.txt end",
        );
        assert_eq!(result.content, "\n\nFile: my notes.txt\n```text\ntodo\n```\n\n end");
    }

    #[test]
    fn test_missing_file_reference_is_left_verbatim() {
        let result = expand("See @missing/file.rs, then stop", &[]);
        assert_eq!(result.content, "See @missing/file.rs, then stop");
        assert!(matches!(
            &result.warnings[..],
            [Warning::FileReferenceFailed { path, .. }] if path == "missing/file.rs"
        ));
    }

    #[test]
    fn test_email_is_not_a_file_reference() {
        let result = expand("Mail user@example.com or @", &[]);
        assert_eq!(result.content, "Mail user@example.com or @");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_file_reference_after_expanded_text_needs_whitespace() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "A").unwrap();
        let ctx = ExpansionContext::new(params(&[("user", "bob")]), dir.path());
        let result = expand_with(
            &BTreeMap::new(),
            &FakeRunner::default(),
            &ctx,
            "${user}@a.txt ${user} @a.txt",
        );
        assert_eq!(result.content, "bob@a.txt bob \n\nFile: a.txt\n```text\nA\n```\n\n");
    }

    #[test]
    fn test_nested_reference_with_arguments() {
        let commands: BTreeMap<_, _> = [command(
            "deploy",
            FrontMatter::new(),
            "Deploy ${env} as ${user} (${1})\n",
        )]
        .into_iter()
        .collect();
        let ctx = ExpansionContext::new(params(&[("env", "staging"), ("user", "ci")]), "/repo");
        let result = expand_with(
            &commands,
            &FakeRunner::default(),
            &ctx,
            "Steps:\n  /deploy env=\"prod\" fast\nDone ${user}",
        );
        assert_eq!(result.content, "Steps:\nDeploy prod as ci (fast)\nDone ci");
        assert_eq!(result.referenced, vec!["deploy".to_string()]);
    }

    #[test]
    fn test_nested_reference_gets_substitution_only() {
        let commands: BTreeMap<_, _> = [command(
            "status",
            FrontMatter::new(),
            "Run !`git status` on @main.go",
        )]
        .into_iter()
        .collect();
        let runner = FakeRunner::default();
        let ctx = ExpansionContext::new(Params::new(), "/repo");
        let result = expand_with(&commands, &runner, &ctx, "/status");
        assert_eq!(result.content, "Run !`git status` on @main.go");
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn test_nested_reference_with_expansion_disabled() {
        let commands: BTreeMap<_, _> = [command(
            "raw",
            FrontMatter::new().with("expand", false),
            "Literal ${env}",
        )]
        .into_iter()
        .collect();
        let ctx = ExpansionContext::new(params(&[("env", "prod")]), "/repo");
        let result = expand_with(&commands, &FakeRunner::default(), &ctx, "/raw");
        assert_eq!(result.content, "Literal ${env}");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_unknown_nested_reference_is_left_as_text() {
        let ctx = ExpansionContext::new(params(&[("x", "1")]), "/repo");
        let result = expand_with(
            &BTreeMap::new(),
            &FakeRunner::default(),
            &ctx,
            "/unknown arg=${x}\n/usr/bin/env is a path",
        );
        assert_eq!(result.content, "/unknown arg=1\n/usr/bin/env is a path");
        assert_eq!(
            result.warnings,
            vec![Warning::FragmentNotFound {
                name: "unknown".into()
            }]
        );
        assert!(result.referenced.is_empty());
    }

    #[test]
    fn test_unknown_reference_line_still_gets_later_stages() {
        let runner = FakeRunner::default().with("date", CommandOutput::success("today\n"));
        let ctx = ExpansionContext::new(params(&[("v", "2")]), "/repo");
        let result = expand_with(
            &BTreeMap::new(),
            &runner,
            &ctx,
            "/api uses version ${v}\n/api built !`date`",
        );
        assert_eq!(result.content, "/api uses version 2\n/api built today");
        assert_eq!(
            result.warnings,
            vec![
                Warning::FragmentNotFound { name: "api".into() },
                Warning::FragmentNotFound { name: "api".into() },
            ]
        );
    }

    #[test]
    fn test_invalid_nested_arguments() {
        let commands: BTreeMap<_, _> = [command("deploy", FrontMatter::new(), "Deploy")]
            .into_iter()
            .collect();
        let ctx = ExpansionContext::new(Params::new(), "/repo");
        let result = expand_with(
            &commands,
            &FakeRunner::default(),
            &ctx,
            "/deploy env=\"unterminated",
        );
        assert_eq!(result.content, "/deploy env=\"unterminated");
        assert!(matches!(
            &result.warnings[..],
            [Warning::InvalidArguments { name, .. }] if name == "deploy"
        ));
    }

    #[test]
    fn test_expand_fragment_respects_flag() {
        let commands = BTreeMap::new();
        let runner = FakeRunner::default();
        let expander = Expander::new(&commands, &runner).unwrap();
        let ctx = ExpansionContext::new(params(&[("name", "Alice")]), "/repo");

        let raw = Fragment::new(
            "/repo/rule.md",
            FragmentKind::Rule,
            FrontMatter::new().with("expand", FrontMatterValue::from(false)),
            "Hi ${name}",
        );
        let result = expander.expand_fragment(&ctx, raw).unwrap();
        assert_eq!(result.fragment.content, "Hi ${name}");

        let live = Fragment::new("/repo/rule.md", FragmentKind::Rule, FrontMatter::new(), "Hi ${name}");
        let result = expander.expand_fragment(&ctx, live).unwrap();
        assert_eq!(result.fragment.content, "Hi Alice");
        assert_eq!(result.fragment.tokens, 2);
    }

    #[test]
    fn test_scan_reference() {
        assert_eq!(scan_reference("main.go"), Some(("main.go".into(), 7)));
        assert_eq!(scan_reference("a\\ b.md) rest"), Some(("a b.md".into(), 7)));
        assert_eq!(scan_reference("?!"), None);
        assert_eq!(scan_reference(" x"), None);
    }
}

//! Context assembly
//!
//! Ties discovery, selection, replacement and expansion together for one
//! invocation:
//!
//! 1. locate and read the task
//! 2. load the command catalog and expand the task body
//! 3. build the selector set from user criteria, auto-selectors and the
//!    `selectors` declared by the task and every command it inlined
//! 4. discover rules, drop the target agent's own files, keep the matching
//!    ones, resolve `replaces`, expand
//! 5. discover skills and keep the matching, well-formed ones
//! 6. concatenate rules, skills, task and attachments into the prompt

use crate::core::front_matter::AGENT_KEY;
use crate::core::{
    estimate_tokens, is_agent_specific, render_available_skills, resolve_replacements, Agent,
    ExpandedFragment, Expander, ExpansionContext, Fragment, FragmentKind, Matcher, Params,
    SelectorMode, SelectorSet, Skill, Warning,
};
use crate::error::{ContextError, Result};
use crate::io::{discover, render_attachment, CommandRunner, FragmentReader, SearchRoot, ShellRunner};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Configuration for one assembly
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Project root; also where commands run and `@path` resolves
    pub base_dir: PathBuf,
    /// Extra search roots, searched after the base directory
    pub search_paths: Vec<PathBuf>,
    /// Home directory, searched last
    pub home_dir: Option<PathBuf>,
    pub params: Params,
    pub selectors: SelectorSet,
    pub mode: SelectorMode,
    /// Resume mode adds `resume=true` and skips rules
    pub resume: bool,
    /// Files appended to the prompt; a missing one is an error
    pub attachments: Vec<PathBuf>,
    /// Agent the context is for; its own rule files are left out
    pub agent: Option<Agent>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            search_paths: Vec::new(),
            home_dir: std::env::var_os("HOME").map(PathBuf::from),
            params: Params::new(),
            selectors: SelectorSet::new(),
            mode: SelectorMode::Flat,
            resume: false,
            attachments: Vec::new(),
            agent: None,
        }
    }
}

impl ContextConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    pub fn with_home_dir(mut self, home: Option<PathBuf>) -> Self {
        self.home_dir = home;
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn with_selectors(mut self, selectors: SelectorSet) -> Self {
        self.selectors = selectors;
        self
    }

    pub fn with_mode(mut self, mode: SelectorMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    pub fn with_attachment(mut self, path: impl Into<PathBuf>) -> Self {
        self.attachments.push(path.into());
        self
    }

    pub fn with_agent(mut self, agent: Option<Agent>) -> Self {
        self.agent = agent;
        self
    }

    /// Search roots in priority order: base directory, extra paths, home
    pub fn roots(&self) -> Vec<SearchRoot> {
        let mut roots = vec![SearchRoot::project(&self.base_dir)];
        roots.extend(
            self.search_paths
                .iter()
                .map(|path| SearchRoot::project(self.base_dir.join(path))),
        );
        if let Some(home) = &self.home_dir {
            roots.push(SearchRoot::home(home));
        }
        roots
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

/// The assembled context
#[derive(Debug, Clone, Serialize)]
pub struct Assembly {
    pub task: ExpandedFragment,
    pub rules: Vec<ExpandedFragment>,
    pub skills: Vec<Skill>,
    /// Target agent, from the task's `agent` key or the configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<Agent>,
    /// Rendered attachment blocks
    pub attachments: Vec<String>,
    pub prompt: String,
    /// Estimated tokens of the whole prompt
    pub tokens: usize,
    pub warnings: Vec<Warning>,
}

/// A task available for `run`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskInfo {
    pub name: String,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Assembles context for tasks under one configuration
pub struct Assembler {
    config: ContextConfig,
    reader: FragmentReader,
    runner: Box<dyn CommandRunner>,
}

impl Assembler {
    /// Create an assembler running commands through `sh`
    pub fn new(config: ContextConfig) -> Self {
        Self::with_runner(config, Box::new(ShellRunner))
    }

    pub fn with_runner(config: ContextConfig, runner: Box<dyn CommandRunner>) -> Self {
        Self {
            config,
            reader: FragmentReader::new(),
            runner,
        }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Assemble the context for `task`, a task name or a path to a task file
    pub fn run(&self, task: &str) -> Result<Assembly> {
        let roots = self.config.roots();
        let mut warnings = Vec::new();

        let task_path = self.locate_task(&roots, task)?;
        let task = self.read(&task_path, FragmentKind::Task, &mut warnings)?;
        let task_name = task.stem();
        info!("Assembling context for task {}", task_name);

        let agent = match task.front_matter().agent() {
            Some(name) => Some(name.parse::<Agent>()?),
            None => self.config.agent,
        };
        if let Some(agent) = agent {
            debug!("Targeting agent {}", agent);
        }

        let commands = self.load_commands(&roots, &mut warnings)?;
        let expander = Expander::new(&commands, self.runner.as_ref())?;
        let ctx = ExpansionContext::new(self.config.params.clone(), &self.config.base_dir);

        let expanded_task = expander.expand_fragment(&ctx, task)?;
        warnings.extend(expanded_task.warnings);
        let task = expanded_task.fragment;

        let mut selectors = self.config.selectors.clone();
        selectors.add_auto_selectors(&task_name, self.config.resume);
        if let Some(agent) = agent {
            selectors.include.set_value(AGENT_KEY, agent.as_str());
        }
        selectors.merge_declared(task.front_matter.selectors());
        for name in &expanded_task.referenced {
            if let Some(command) = commands.get(name) {
                selectors.merge_declared(command.front_matter().selectors());
            }
        }
        debug!("Include selectors: {}", selectors.include);
        debug!("Exclude selectors: {}", selectors.exclude);

        let (rules, skills) = if self.config.resume {
            info!("Resume mode: skipping rules and skills");
            (Vec::new(), Vec::new())
        } else {
            let matcher = self.config.mode.clone().into_matcher(selectors);
            let mut selected = Vec::new();
            for path in discover(&roots, FragmentKind::Rule) {
                if agent.is_some() && belongs_to_agent(&roots, &path) {
                    debug!("Rule {} is agent-specific, skipping", path.display());
                    continue;
                }
                let rule = self.read(&path, FragmentKind::Rule, &mut warnings)?;
                if matcher.matches(rule.front_matter()) {
                    selected.push(rule);
                } else {
                    debug!("Rule {} not selected", path.display());
                }
            }

            let (kept, conflicts) = resolve_replacements(selected);
            warnings.extend(conflicts);

            let mut rules = Vec::with_capacity(kept.len());
            for rule in kept {
                let expanded = expander.expand_fragment(&ctx, rule)?;
                warnings.extend(expanded.warnings);
                rules.push(expanded.fragment);
            }

            let skills = self.load_skills(&roots, matcher.as_ref(), &mut warnings)?;
            (rules, skills)
        };

        let attachments = self
            .config
            .attachments
            .iter()
            .map(|path| {
                render_attachment(&path.display().to_string(), &self.config.resolve(path))
            })
            .collect::<Result<Vec<_>>>()?;

        let prompt = compose_prompt(&rules, &skills, &task, &attachments);
        let tokens = estimate_tokens(&prompt);
        for warning in &warnings {
            warn!("{}", warning);
        }
        info!(
            "Included {} rules and {} skills for task {} (~{} tokens)",
            rules.len(),
            skills.len(),
            task_name,
            tokens
        );

        Ok(Assembly {
            task,
            rules,
            skills,
            agent,
            attachments,
            prompt,
            tokens,
            warnings,
        })
    }

    /// Tasks visible from the configured roots; earlier roots shadow later ones
    pub fn list_tasks(&self) -> Result<Vec<TaskInfo>> {
        let mut seen = HashSet::new();
        let mut tasks = Vec::new();
        let mut warnings = Vec::new();

        for root in self.config.roots() {
            for path in root.files(FragmentKind::Task) {
                let task = self.read(&path, FragmentKind::Task, &mut warnings)?;
                let name = task.stem();
                if !seen.insert(name.clone()) {
                    continue;
                }
                tasks.push(TaskInfo {
                    name,
                    description: task.front_matter().description().map(str::to_string),
                    path,
                });
            }
        }
        for warning in &warnings {
            warn!("{}", warning);
        }
        Ok(tasks)
    }

    fn read(
        &self,
        path: &Path,
        kind: FragmentKind,
        warnings: &mut Vec<Warning>,
    ) -> Result<Fragment> {
        let (fragment, warning) = self.reader.read_file(path, kind)?;
        warnings.extend(warning);
        Ok(fragment)
    }

    /// Resolve a task argument to a file
    fn locate_task(&self, roots: &[SearchRoot], task: &str) -> Result<PathBuf> {
        if looks_like_path(task) {
            let path = self.config.resolve(Path::new(task));
            if !path.is_file() {
                return Err(ContextError::file_not_found(path));
            }
            return Ok(path);
        }

        for root in roots {
            let mut candidates: Vec<PathBuf> = root
                .files(FragmentKind::Task)
                .into_iter()
                .filter(|path| path.file_stem().is_some_and(|stem| stem == task))
                .collect();
            match candidates.len() {
                0 => continue,
                1 => return Ok(candidates.remove(0)),
                _ => return Err(ContextError::ambiguous_task(task, candidates)),
            }
        }
        Err(ContextError::task_not_found(task))
    }

    /// Selected skills with a usable name and description
    fn load_skills(
        &self,
        roots: &[SearchRoot],
        matcher: &dyn Matcher,
        warnings: &mut Vec<Warning>,
    ) -> Result<Vec<Skill>> {
        let mut skills = Vec::new();
        for path in discover(roots, FragmentKind::Skill) {
            let fragment = self.read(&path, FragmentKind::Skill, warnings)?;
            if !matcher.matches(fragment.front_matter()) {
                debug!("Skill {} not selected", path.display());
                continue;
            }
            match Skill::from_fragment(&fragment) {
                Ok(skill) => skills.push(skill),
                Err(reason) => warnings.push(Warning::InvalidSkill { path, reason }),
            }
        }
        Ok(skills)
    }

    /// Command fragments by name; earlier roots win
    fn load_commands(
        &self,
        roots: &[SearchRoot],
        warnings: &mut Vec<Warning>,
    ) -> Result<BTreeMap<String, Fragment>> {
        let mut commands = BTreeMap::new();
        for path in discover(roots, FragmentKind::Command) {
            let command = self.read(&path, FragmentKind::Command, warnings)?;
            commands.entry(command.stem()).or_insert(command);
        }
        Ok(commands)
    }
}

/// A task argument naming a file rather than a task
fn looks_like_path(task: &str) -> bool {
    let path = Path::new(task);
    path.components().count() > 1 || FragmentReader::is_markdown_file(path)
}

/// True if `path` is some agent's own configuration file under one of `roots`
fn belongs_to_agent(roots: &[SearchRoot], path: &Path) -> bool {
    roots
        .iter()
        .find_map(|root| root.relative(path))
        .is_some_and(is_agent_specific)
}

fn compose_prompt(
    rules: &[ExpandedFragment],
    skills: &[Skill],
    task: &ExpandedFragment,
    attachments: &[String],
) -> String {
    let mut parts: Vec<&str> = rules.iter().map(|rule| rule.content.as_str()).collect();
    let skills = render_available_skills(skills);
    if !skills.is_empty() {
        parts.push(&skills);
    }
    parts.push(&task.content);
    parts.extend(attachments.iter().map(String::as_str));
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_looks_like_path() {
        assert!(looks_like_path("tasks/fix.md"));
        assert!(looks_like_path("fix.md"));
        assert!(looks_like_path("./fix"));
        assert!(!looks_like_path("fix-bug"));
    }

    #[test]
    fn test_belongs_to_agent() {
        let roots = vec![SearchRoot::project("/work/.claude-sandbox/repo")];
        assert!(belongs_to_agent(
            &roots,
            Path::new("/work/.claude-sandbox/repo/CLAUDE.md")
        ));
        assert!(!belongs_to_agent(
            &roots,
            Path::new("/work/.claude-sandbox/repo/.agents/rules/a.md")
        ));
    }

    #[test]
    fn test_roots_order() {
        let config = ContextConfig::new("/repo")
            .with_search_path("shared")
            .with_search_path("/opt/rules")
            .with_home_dir(Some(PathBuf::from("/home/dev")));
        let roots: Vec<PathBuf> = config
            .roots()
            .iter()
            .map(|root| root.path().to_path_buf())
            .collect();
        assert_eq!(
            roots,
            vec![
                PathBuf::from("/repo"),
                PathBuf::from("/repo/shared"),
                PathBuf::from("/opt/rules"),
                PathBuf::from("/home/dev"),
            ]
        );
    }

    #[test]
    fn test_compose_prompt() {
        let fragment = |content: &str| {
            ExpandedFragment::new(
                Fragment::new("x.md", FragmentKind::Rule, Default::default(), ""),
                content.to_string(),
            )
        };
        let prompt = compose_prompt(
            &[fragment("rule one"), fragment("rule two")],
            &[],
            &fragment("the task"),
            &["File: a\n```text\nA\n```\n".to_string()],
        );
        assert_eq!(prompt, "rule one\nrule two\nthe task\nFile: a\n```text\nA\n```\n");

        let skill = Skill {
            name: "pdf".into(),
            description: "PDFs".into(),
            path: PathBuf::from("/repo/.agents/skills/pdf/SKILL.md"),
            tokens: 0,
        };
        let prompt = compose_prompt(&[fragment("rule")], &[skill], &fragment("task"), &[]);
        assert_eq!(
            prompt,
            "rule\n<available_skills>\n  <skill>\n    <name>pdf</name>\n    \
             <description>PDFs</description>\n  </skill>\n</available_skills>\ntask"
        );
    }
}

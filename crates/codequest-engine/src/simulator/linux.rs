//! A small in-memory directory tree that answers common shell commands.
//!
//! Paths are absolute strings. Directories map to their listing, and file
//! contents are only known for files the learner wrote through a redirect.
//! Pipelines feed the first command's output through text filters
//! (`grep`, `wc`, `head`, `tail`, `sort`, `uniq`), and a trailing `>` or
//! `>>` writes the result to a file.

use std::collections::BTreeMap;

use codequest_types::{EntryKind, FileEntry, FileSystemSnapshot};

use super::{CommandOutcome, strip_dot_slash, tokenize};

const FOLDER_PERMISSIONS: &str = "drwxr-xr-x";
const FILE_PERMISSIONS: &str = "-rw-r--r--";
const FOLDER_SIZE: u64 = 4096;

const PROCESS_TABLE: &str = "\
USER       PID %CPU %MEM COMMAND
root         1  0.0  0.1 /sbin/init
root       412  0.0  0.2 /usr/sbin/sshd -D
user      1024  0.1  0.4 -bash
user      2048  0.0  0.1 ps aux";

/// Bit positions of `rwx` for user, group and other in a permission string.
const PERMISSION_SLOTS: [[usize; 3]; 3] = [[1, 2, 3], [4, 5, 6], [7, 8, 9]];

/// A simulated directory tree with a working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSystemWorld {
    home: String,
    cwd: String,
    dirs: BTreeMap<String, Vec<FileEntry>>,
    contents: BTreeMap<String, String>,
}

impl FileSystemWorld {
    /// Seed the tree from a level's snapshot. The snapshot's path becomes
    /// both the home and the working directory.
    pub fn new(snapshot: &FileSystemSnapshot) -> Self {
        let home = normalize_path("/", &snapshot.current_path);
        let mut world = Self {
            home: home.clone(),
            cwd: home.clone(),
            dirs: BTreeMap::new(),
            contents: BTreeMap::new(),
        };
        world.dirs.insert("/".to_owned(), Vec::new());
        world.make_dirs(&home);
        world.dirs.insert(home.clone(), snapshot.entries.clone());
        for entry in &snapshot.entries {
            if entry.kind == EntryKind::Folder {
                world.dirs.insert(join(&home, &entry.name), Vec::new());
            }
        }
        world
    }

    /// The working directory and its listing.
    pub fn snapshot(&self) -> FileSystemSnapshot {
        FileSystemSnapshot {
            current_path: self.cwd.clone(),
            entries: self.dirs.get(&self.cwd).cloned().unwrap_or_default(),
        }
    }

    /// Run one command line.
    pub fn apply(&mut self, input: &str) -> CommandOutcome {
        let line = input.trim();
        let not_found = || CommandOutcome::output(format!("{line}: command not found"));

        let mut stages: Vec<Vec<String>> = split_pipeline(line).iter().map(|s| tokenize(s)).collect();
        let redirect = match stages.last_mut().map(extract_redirect) {
            Some(Ok(redirect)) => redirect,
            Some(Err(message)) => return CommandOutcome::output(message),
            None => None,
        };
        let piped = stages.len() > 1 || redirect.is_some();

        let Some((first, rest)) = stages.split_first() else {
            return not_found();
        };
        let mut outcome = if let Some(command) = parse_command(first) {
            self.run(command, piped)
        } else if let Some((filter, files)) = parse_filter(first).filter(|(_, f)| !f.is_empty()) {
            match self.read_files(first.first().map_or("", String::as_str), &files) {
                Ok(text) => CommandOutcome::output(filter.apply(&text)),
                Err(message) => CommandOutcome::output(message),
            }
        } else {
            return not_found();
        };

        for stage in rest {
            let Some((filter, _)) = parse_filter(stage) else {
                return CommandOutcome::output(format!("{}: command not found", stage.join(" ")));
            };
            outcome.display = filter.apply(&outcome.display);
        }

        match redirect {
            Some((target, append)) => self.write_file(&target, &outcome.display, append),
            None => outcome,
        }
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    fn run(&mut self, command: ShellCommand, piped: bool) -> CommandOutcome {
        match command {
            ShellCommand::List { flags, targets } => {
                CommandOutcome::output(self.list(&flags, &targets, piped))
            }
            ShellCommand::Pwd => CommandOutcome::output(self.cwd.clone()),
            ShellCommand::Whoami => CommandOutcome::output(self.user()),
            ShellCommand::ChangeDir(target) => self.change_dir(target.as_deref()),
            ShellCommand::MakeDir { parents, paths } => self.make_dir(parents, &paths),
            ShellCommand::Touch(paths) => self.touch(&paths),
            ShellCommand::Copy {
                recursive,
                from,
                to,
            } => self.transfer("cp", &from, &to, true, recursive),
            ShellCommand::Move { from, to } => self.transfer("mv", &from, &to, false, true),
            ShellCommand::Remove {
                recursive,
                force,
                paths,
            } => self.remove(recursive, force, &paths),
            ShellCommand::Chmod { mode, paths } => self.chmod(&mode, &paths),
            ShellCommand::Chown { owner, paths } => self.chown(&owner, &paths),
            ShellCommand::Cat(paths) => match self.read_files("cat", &paths) {
                Ok(text) | Err(text) => CommandOutcome::output(text),
            },
            ShellCommand::Find { root, name, kind } => {
                CommandOutcome::output(self.find(&root, name.as_deref(), kind))
            }
            ShellCommand::Processes => CommandOutcome::output(PROCESS_TABLE),
            ShellCommand::DiskUsage { human, path } => {
                CommandOutcome::output(self.disk_usage(human, path.as_deref().unwrap_or(".")))
            }
            ShellCommand::Echo(words) => CommandOutcome::output(words.join(" ")),
            ShellCommand::Usage(message) => CommandOutcome::output(message),
        }
    }

    fn list(&self, flags: &[char], targets: &[String], piped: bool) -> String {
        if let Some(bad) = flags.iter().find(|f| !matches!(**f, 'l' | 'a' | '1' | 'h')) {
            return format!("ls: invalid option -- '{bad}'");
        }
        let long = flags.contains(&'l');
        let all = flags.contains(&'a');
        let one_per_line = piped || flags.contains(&'1');

        let target = targets.first().map_or(".", String::as_str);
        let path = self.resolve(target);
        let entries: Vec<FileEntry> = match self.dirs.get(&path) {
            Some(listing) => {
                let mut shown = Vec::new();
                if all {
                    shown.push(folder("."));
                    shown.push(folder(".."));
                }
                shown.extend(
                    listing
                        .iter()
                        .filter(|e| all || !e.name.starts_with('.'))
                        .cloned(),
                );
                shown
            }
            None => match self.lookup(&path) {
                Some(entry) => vec![FileEntry {
                    name: target.to_owned(),
                    ..entry.clone()
                }],
                None => return format!("ls: cannot access '{target}': No such file or directory"),
            },
        };

        if long {
            let user = self.user();
            entries
                .iter()
                .map(|e| format!("{} 1 {user} {user} {:>6} {}", e.permissions, e.size, e.name))
                .collect::<Vec<_>>()
                .join("\n")
        } else {
            let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
            names.join(if one_per_line { "\n" } else { "  " })
        }
    }

    fn change_dir(&mut self, target: Option<&str>) -> CommandOutcome {
        let target = target.unwrap_or("~");
        let path = self.resolve(target);
        if self.dirs.contains_key(&path) {
            let moved = path != self.cwd;
            self.cwd = path;
            CommandOutcome {
                display: String::new(),
                mutated: moved,
            }
        } else if self.lookup(&path).is_some() {
            CommandOutcome::output(format!("cd: {target}: Not a directory"))
        } else {
            CommandOutcome::output(format!("cd: {target}: No such file or directory"))
        }
    }

    fn make_dir(&mut self, parents: bool, paths: &[String]) -> CommandOutcome {
        let mut messages = Vec::new();
        let mut mutated = false;
        for arg in paths {
            let path = self.resolve(arg);
            if self.exists(&path) {
                if !parents {
                    messages.push(format!("mkdir: cannot create directory '{arg}': File exists"));
                }
                continue;
            }
            let (parent, _) = split_path(&path);
            if !parents && !self.dirs.contains_key(&parent) {
                messages.push(format!(
                    "mkdir: cannot create directory '{arg}': No such file or directory"
                ));
                continue;
            }
            self.make_dirs(&path);
            mutated = true;
        }
        CommandOutcome {
            display: messages.join("\n"),
            mutated,
        }
    }

    /// Create `path` and any missing ancestors.
    fn make_dirs(&mut self, path: &str) {
        let mut current = "/".to_owned();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            let next = join(&current, part);
            if !self.dirs.contains_key(&next) {
                self.put_entry(&current, folder(part));
                self.dirs.insert(next.clone(), Vec::new());
            }
            current = next;
        }
    }

    fn touch(&mut self, paths: &[String]) -> CommandOutcome {
        let mut messages = Vec::new();
        let mut mutated = false;
        for arg in paths {
            let path = self.resolve(arg);
            if self.exists(&path) {
                continue;
            }
            let (parent, name) = split_path(&path);
            if self.dirs.contains_key(&parent) {
                self.put_entry(&parent, file(name, 0));
                mutated = true;
            } else {
                messages.push(format!("touch: cannot touch '{arg}': No such file or directory"));
            }
        }
        CommandOutcome {
            display: messages.join("\n"),
            mutated,
        }
    }

    /// Copy or move `from_arg` to `to_arg`, descending into directories.
    fn transfer(
        &mut self,
        cmd: &str,
        from_arg: &str,
        to_arg: &str,
        keep_source: bool,
        recursive: bool,
    ) -> CommandOutcome {
        let from = self.resolve(from_arg);
        let Some(entry) = self.lookup(&from).cloned() else {
            return CommandOutcome::output(format!(
                "{cmd}: cannot stat '{from_arg}': No such file or directory"
            ));
        };
        let is_dir = entry.kind == EntryKind::Folder;
        if is_dir && !recursive {
            return CommandOutcome::output(format!(
                "{cmd}: -r not specified; omitting directory '{from_arg}'"
            ));
        }

        let mut to = self.resolve(to_arg);
        if self.dirs.contains_key(&to) {
            to = join(&to, &entry.name);
        }
        if to == from {
            return CommandOutcome::output(format!(
                "{cmd}: '{from_arg}' and '{to_arg}' are the same file"
            ));
        }
        if is_dir && to.starts_with(&format!("{from}/")) {
            return CommandOutcome::output(format!(
                "{cmd}: cannot copy a directory, '{from_arg}', into itself"
            ));
        }
        let (parent, name) = split_path(&to);
        if !self.dirs.contains_key(&parent) {
            return CommandOutcome::output(format!(
                "{cmd}: cannot create regular file '{to_arg}': No such file or directory"
            ));
        }

        let subtree: Vec<(String, Vec<FileEntry>)> = self
            .dirs
            .iter()
            .filter_map(|(k, v)| rebase(k, &from, &to).map(|k| (k, v.clone())))
            .collect();
        let texts: Vec<(String, String)> = self
            .contents
            .iter()
            .filter_map(|(k, v)| rebase(k, &from, &to).map(|k| (k, v.clone())))
            .collect();

        if !keep_source {
            self.remove_path(&from);
        }
        self.remove_path(&to);
        self.put_entry(
            &parent,
            FileEntry {
                name: name.to_owned(),
                ..entry
            },
        );
        self.dirs.extend(subtree);
        self.contents.extend(texts);
        CommandOutcome::changed("")
    }

    fn remove(&mut self, recursive: bool, force: bool, paths: &[String]) -> CommandOutcome {
        let mut messages = Vec::new();
        let mut mutated = false;
        for arg in paths {
            let path = self.resolve(arg);
            match self.lookup(&path).map(|e| e.kind) {
                None if force => {}
                None => messages.push(format!(
                    "rm: cannot remove '{arg}': No such file or directory"
                )),
                Some(EntryKind::Folder) if !recursive => {
                    messages.push(format!("rm: cannot remove '{arg}': Is a directory"));
                }
                Some(_) => {
                    self.remove_path(&path);
                    mutated = true;
                }
            }
        }
        CommandOutcome {
            display: messages.join("\n"),
            mutated,
        }
    }

    fn chmod(&mut self, mode: &str, paths: &[String]) -> CommandOutcome {
        let mut messages = Vec::new();
        let mut mutated = false;
        for arg in paths {
            let path = self.resolve(arg);
            let (parent, name) = split_path(&path);
            let Some(entry) = self
                .dirs
                .get_mut(&parent)
                .and_then(|listing| listing.iter_mut().find(|e| e.name == name))
            else {
                messages.push(format!(
                    "chmod: cannot access '{arg}': No such file or directory"
                ));
                continue;
            };
            let Some(updated) = apply_mode(&entry.permissions, mode) else {
                return CommandOutcome::output(format!("chmod: invalid mode: '{mode}'"));
            };
            if updated != entry.permissions {
                entry.permissions = updated;
                mutated = true;
            }
        }
        CommandOutcome {
            display: messages.join("\n"),
            mutated,
        }
    }

    fn chown(&self, owner: &str, paths: &[String]) -> CommandOutcome {
        let user = self.user();
        let lines: Vec<String> = paths
            .iter()
            .map(|arg| {
                if self.exists(&self.resolve(arg)) {
                    format!("changed ownership of '{arg}' from {user} to {owner}")
                } else {
                    format!("chown: cannot access '{arg}': No such file or directory")
                }
            })
            .collect();
        CommandOutcome::output(lines.join("\n"))
    }

    /// Concatenate file contents, or the first error met.
    fn read_files(&self, cmd: &str, paths: &[String]) -> Result<String, String> {
        let mut parts = Vec::new();
        for arg in paths {
            let path = self.resolve(arg);
            match self.lookup(&path) {
                None => return Err(format!("{cmd}: {arg}: No such file or directory")),
                Some(e) if e.kind == EntryKind::Folder => {
                    return Err(format!("{cmd}: {arg}: Is a directory"));
                }
                Some(e) => parts.push(
                    self.contents
                        .get(&path)
                        .cloned()
                        .unwrap_or_else(|| format!("<{} bytes of {}>", e.size, e.name)),
                ),
            }
        }
        Ok(parts.join("\n"))
    }

    fn find(&self, root: &str, name: Option<&str>, kind: Option<EntryKind>) -> String {
        let start = self.resolve(root);
        if !self.dirs.contains_key(&start) {
            return format!("find: '{root}': No such file or directory");
        }
        let mut found = Vec::new();
        let root_name = split_path(&start).1.to_owned();
        let keep = |entry_name: &str, entry_kind: EntryKind| {
            name.is_none_or(|pattern| glob_match(pattern, entry_name))
                && kind.is_none_or(|k| k == entry_kind)
        };
        if keep(&root_name, EntryKind::Folder) {
            found.push(root.to_owned());
        }
        self.walk(&start, root, &mut |label, entry| {
            if keep(&entry.name, entry.kind) {
                found.push(label.to_owned());
            }
        });
        found.join("\n")
    }

    /// Visit every entry below `path`, depth first.
    fn walk(&self, path: &str, label: &str, visit: &mut dyn FnMut(&str, &FileEntry)) {
        for entry in self.dirs.get(path).into_iter().flatten() {
            let child_label = join(label, &entry.name);
            visit(&child_label, entry);
            if entry.kind == EntryKind::Folder {
                self.walk(&join(path, &entry.name), &child_label, visit);
            }
        }
    }

    fn disk_usage(&self, human: bool, target: &str) -> String {
        let path = self.resolve(target);
        if !self.exists(&path) && path != "/" {
            return format!("du: cannot access '{target}': No such file or directory");
        }
        let mut lines = Vec::new();
        let total = self.usage_of(&path, target, &mut lines);
        lines.push((total, target.to_owned()));
        lines
            .iter()
            .map(|(size, label)| {
                let size = if human {
                    human_size(*size)
                } else {
                    size.div_ceil(1024).to_string()
                };
                format!("{size}\t{label}")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn usage_of(&self, path: &str, label: &str, lines: &mut Vec<(u64, String)>) -> u64 {
        let mut total = 0_u64;
        for entry in self.dirs.get(path).into_iter().flatten() {
            total = total.saturating_add(entry.size);
            if entry.kind == EntryKind::Folder {
                let child_label = join(label, &entry.name);
                let nested = self.usage_of(&join(path, &entry.name), &child_label, lines);
                lines.push((nested.saturating_add(entry.size), child_label));
                total = total.saturating_add(nested);
            }
        }
        total
    }

    fn write_file(&mut self, target: &str, text: &str, append: bool) -> CommandOutcome {
        let path = self.resolve(target);
        if self.dirs.contains_key(&path) {
            return CommandOutcome::output(format!("bash: {target}: Is a directory"));
        }
        let (parent, name) = split_path(&path);
        if !self.dirs.contains_key(&parent) {
            return CommandOutcome::output(format!("bash: {target}: No such file or directory"));
        }
        let content = match self.contents.get(&path) {
            Some(existing) if append && !existing.is_empty() => format!("{existing}\n{text}"),
            _ => text.to_owned(),
        };
        let size = u64::try_from(content.len()).unwrap_or(u64::MAX);
        let permissions = self
            .lookup(&path)
            .map_or_else(|| FILE_PERMISSIONS.to_owned(), |e| e.permissions.clone());
        self.put_entry(
            &parent,
            FileEntry {
                name: name.to_owned(),
                kind: EntryKind::File,
                permissions,
                size,
            },
        );
        self.contents.insert(path, content);
        CommandOutcome::changed("")
    }

    // -----------------------------------------------------------------------
    // Tree helpers
    // -----------------------------------------------------------------------

    fn user(&self) -> String {
        split_path(&self.home).1.to_owned()
    }

    fn resolve(&self, arg: &str) -> String {
        let arg = strip_dot_slash(arg);
        if arg == "~" {
            return self.home.clone();
        }
        if let Some(rest) = arg.strip_prefix("~/") {
            return normalize_path(&self.home, rest);
        }
        normalize_path(&self.cwd, arg)
    }

    fn lookup(&self, path: &str) -> Option<&FileEntry> {
        let (parent, name) = split_path(path);
        self.dirs.get(&parent)?.iter().find(|e| e.name == name)
    }

    fn exists(&self, path: &str) -> bool {
        self.dirs.contains_key(path) || self.lookup(path).is_some()
    }

    /// Insert or replace an entry in `dir`'s listing.
    fn put_entry(&mut self, dir: &str, entry: FileEntry) {
        let listing = self.dirs.entry(dir.to_owned()).or_default();
        match listing.iter_mut().find(|e| e.name == entry.name) {
            Some(slot) => *slot = entry,
            None => listing.push(entry),
        }
    }

    fn remove_path(&mut self, path: &str) {
        let (parent, name) = split_path(path);
        if let Some(listing) = self.dirs.get_mut(&parent) {
            listing.retain(|e| e.name != name);
        }
        let nested = format!("{path}/");
        self.dirs.retain(|k, _| k != path && !k.starts_with(&nested));
        self.contents.retain(|k, _| k != path && !k.starts_with(&nested));
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum ShellCommand {
    List { flags: Vec<char>, targets: Vec<String> },
    Pwd,
    Whoami,
    ChangeDir(Option<String>),
    MakeDir { parents: bool, paths: Vec<String> },
    Touch(Vec<String>),
    Copy { recursive: bool, from: String, to: String },
    Move { from: String, to: String },
    Remove { recursive: bool, force: bool, paths: Vec<String> },
    Chmod { mode: String, paths: Vec<String> },
    Chown { owner: String, paths: Vec<String> },
    Cat(Vec<String>),
    Find { root: String, name: Option<String>, kind: Option<EntryKind> },
    Processes,
    DiskUsage { human: bool, path: Option<String> },
    Echo(Vec<String>),
    /// A known command used wrongly; carries the shell's complaint.
    Usage(String),
}

fn parse_command(words: &[String]) -> Option<ShellCommand> {
    let (name, args) = words.split_first()?;
    let (flags, operands) = split_flags(args);
    let missing = || ShellCommand::Usage(format!("{name}: missing operand"));
    let command = match name.as_str() {
        "ls" | "ll" | "dir" => ShellCommand::List {
            flags: if name == "ll" { vec!['l', 'a'] } else { flags },
            targets: operands,
        },
        "pwd" => ShellCommand::Pwd,
        "whoami" => ShellCommand::Whoami,
        "cd" => match operands.as_slice() {
            [] => ShellCommand::ChangeDir(None),
            [dir] => ShellCommand::ChangeDir(Some(dir.clone())),
            _ => ShellCommand::Usage("cd: too many arguments".to_owned()),
        },
        "mkdir" if operands.is_empty() => missing(),
        "mkdir" => ShellCommand::MakeDir {
            parents: flags.contains(&'p'),
            paths: operands,
        },
        "touch" if operands.is_empty() => missing(),
        "touch" => ShellCommand::Touch(operands),
        "cp" | "mv" => match operands.as_slice() {
            [from, to] if name == "cp" => ShellCommand::Copy {
                recursive: flags.contains(&'r') || flags.contains(&'R'),
                from: from.clone(),
                to: to.clone(),
            },
            [from, to] => ShellCommand::Move {
                from: from.clone(),
                to: to.clone(),
            },
            _ => missing(),
        },
        "rm" if operands.is_empty() => missing(),
        "rm" => ShellCommand::Remove {
            recursive: flags.contains(&'r') || flags.contains(&'R'),
            force: flags.contains(&'f'),
            paths: operands,
        },
        "chmod" | "chown" => match args.split_first() {
            Some((first, paths)) if !paths.is_empty() => {
                let paths = paths.to_vec();
                if name == "chmod" {
                    ShellCommand::Chmod {
                        mode: first.clone(),
                        paths,
                    }
                } else {
                    ShellCommand::Chown {
                        owner: first.clone(),
                        paths,
                    }
                }
            }
            _ => missing(),
        },
        "cat" if operands.is_empty() => missing(),
        "cat" => ShellCommand::Cat(operands),
        "find" => parse_find(args)?,
        "ps" | "top" => ShellCommand::Processes,
        "du" => ShellCommand::DiskUsage {
            human: flags.contains(&'h'),
            path: operands.first().cloned(),
        },
        "echo" => ShellCommand::Echo(args.to_vec()),
        _ => return None,
    };
    Some(command)
}

fn parse_find(args: &[String]) -> Option<ShellCommand> {
    let mut root = ".".to_owned();
    let mut name = None;
    let mut kind = None;
    let mut iter = args.iter().peekable();
    if let Some(first) = iter.next_if(|first| !first.starts_with('-')) {
        root = first.clone();
    }
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-name" | "-iname" => name = Some(iter.next()?.clone()),
            "-type" => {
                kind = Some(match iter.next()?.as_str() {
                    "f" => EntryKind::File,
                    "d" => EntryKind::Folder,
                    _ => return None,
                });
            }
            _ => return None,
        }
    }
    Some(ShellCommand::Find { root, name, kind })
}

/// Separate single-dash flag clusters from operands.
fn split_flags(args: &[String]) -> (Vec<char>, Vec<String>) {
    let mut flags = Vec::new();
    let mut operands = Vec::new();
    for arg in args {
        match arg.strip_prefix('-') {
            Some(cluster) if !cluster.is_empty() && !cluster.starts_with('-') => {
                flags.extend(cluster.chars());
            }
            Some(long) if long.starts_with('-') => {}
            _ => operands.push(arg.clone()),
        }
    }
    (flags, operands)
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Filter {
    Grep {
        pattern: String,
        ignore_case: bool,
        invert: bool,
        count: bool,
    },
    Count {
        lines_only: bool,
    },
    Head(usize),
    Tail(usize),
    Sort {
        reverse: bool,
    },
    Unique,
}

impl Filter {
    fn apply(&self, text: &str) -> String {
        let lines: Vec<&str> = text.lines().collect();
        match self {
            Self::Grep {
                pattern,
                ignore_case,
                invert,
                count,
            } => {
                let needle = if *ignore_case {
                    pattern.to_lowercase()
                } else {
                    pattern.clone()
                };
                let hits: Vec<&str> = lines
                    .into_iter()
                    .filter(|line| {
                        let found = if *ignore_case {
                            line.to_lowercase().contains(&needle)
                        } else {
                            line.contains(&needle)
                        };
                        found != *invert
                    })
                    .collect();
                if *count {
                    hits.len().to_string()
                } else {
                    hits.join("\n")
                }
            }
            Self::Count { lines_only: true } => lines.len().to_string(),
            Self::Count { lines_only: false } => format!(
                "{} {} {}",
                lines.len(),
                text.split_whitespace().count(),
                text.chars().count()
            ),
            Self::Head(n) => lines.into_iter().take(*n).collect::<Vec<_>>().join("\n"),
            Self::Tail(n) => lines
                .iter()
                .skip(lines.len().saturating_sub(*n))
                .copied()
                .collect::<Vec<_>>()
                .join("\n"),
            Self::Sort { reverse } => {
                let mut sorted = lines;
                sorted.sort_unstable();
                if *reverse {
                    sorted.reverse();
                }
                sorted.join("\n")
            }
            Self::Unique => {
                let mut unique = lines;
                unique.dedup();
                unique.join("\n")
            }
        }
    }
}

/// Parse a filter and its file operands.
fn parse_filter(words: &[String]) -> Option<(Filter, Vec<String>)> {
    let (name, args) = words.split_first()?;
    match name.as_str() {
        "grep" => {
            let (flags, mut operands) = split_flags(args);
            if operands.is_empty() {
                return None;
            }
            let pattern = operands.remove(0);
            let filter = Filter::Grep {
                pattern,
                ignore_case: flags.contains(&'i'),
                invert: flags.contains(&'v'),
                count: flags.contains(&'c'),
            };
            Some((filter, operands))
        }
        "wc" => {
            let (flags, operands) = split_flags(args);
            Some((
                Filter::Count {
                    lines_only: flags.contains(&'l'),
                },
                operands,
            ))
        }
        "head" | "tail" => {
            let mut count = 10;
            let mut operands = Vec::new();
            let mut iter = args.iter();
            while let Some(arg) = iter.next() {
                if arg == "-n" {
                    count = iter.next()?.parse().ok()?;
                } else if let Some(n) = arg.strip_prefix('-') {
                    count = n.parse().ok()?;
                } else {
                    operands.push(arg.clone());
                }
            }
            let filter = if name == "head" {
                Filter::Head(count)
            } else {
                Filter::Tail(count)
            };
            Some((filter, operands))
        }
        "sort" => {
            let (flags, operands) = split_flags(args);
            Some((
                Filter::Sort {
                    reverse: flags.contains(&'r'),
                },
                operands,
            ))
        }
        "uniq" => Some((Filter::Unique, split_flags(args).1)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Line and path helpers
// ---------------------------------------------------------------------------

/// Split a command line on `|` outside quotes.
fn split_pipeline(line: &str) -> Vec<String> {
    let mut stages = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for c in line.chars() {
        match quote {
            Some(q) if c == q => {
                quote = None;
                current.push(c);
            }
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                current.push(c);
            }
            None if c == '|' => stages.push(std::mem::take(&mut current)),
            None => current.push(c),
        }
    }
    stages.push(current);
    stages
}

/// Remove a trailing `> file` or `>> file` from a stage.
fn extract_redirect(words: &mut Vec<String>) -> Result<Option<(String, bool)>, String> {
    let Some(pos) = words.iter().position(|w| w == ">" || w == ">>") else {
        return Ok(None);
    };
    let tail = words.split_off(pos);
    match tail.as_slice() {
        [op, target] => Ok(Some((target.clone(), op == ">>"))),
        [_] => Err("bash: syntax error near unexpected token `newline'".to_owned()),
        _ => Err("bash: syntax error: too many redirect targets".to_owned()),
    }
}

fn join(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// Split an absolute path into its parent directory and final component.
fn split_path(path: &str) -> (String, &str) {
    match path.rsplit_once('/') {
        Some(("", name)) => ("/".to_owned(), name),
        Some((parent, name)) => (parent.to_owned(), name),
        None => ("/".to_owned(), path),
    }
}

/// Resolve `arg` against `base`, folding `.` and `..`.
fn normalize_path(base: &str, arg: &str) -> String {
    let start = if arg.starts_with('/') { "" } else { base };
    let mut parts: Vec<&str> = Vec::new();
    for part in start.split('/').chain(arg.split('/')) {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            p => parts.push(p),
        }
    }
    format!("/{}", parts.join("/"))
}

/// Re-root `key` from `from` to `to` when it lies at or under `from`.
fn rebase(key: &str, from: &str, to: &str) -> Option<String> {
    let rest = key.strip_prefix(from)?;
    (rest.is_empty() || rest.starts_with('/')).then(|| format!("{to}{rest}"))
}

fn folder(name: &str) -> FileEntry {
    FileEntry {
        name: name.to_owned(),
        kind: EntryKind::Folder,
        permissions: FOLDER_PERMISSIONS.to_owned(),
        size: FOLDER_SIZE,
    }
}

fn file(name: &str, size: u64) -> FileEntry {
    FileEntry {
        name: name.to_owned(),
        kind: EntryKind::File,
        permissions: FILE_PERMISSIONS.to_owned(),
        size,
    }
}

/// Apply a symbolic (`+x`, `u+x`, `go-w`, `a=r`) or octal (`755`) mode.
fn apply_mode(current: &str, mode: &str) -> Option<String> {
    let mut chars: Vec<char> = current.chars().collect();
    if chars.len() != 10 {
        chars = FILE_PERMISSIONS.chars().collect();
    }

    if mode.len() == 3 && mode.chars().all(|c| c.is_digit(8)) {
        for (who, digit) in mode.chars().enumerate() {
            let bits = digit.to_digit(8)?;
            for (perm, (mask, letter)) in [(4, 'r'), (2, 'w'), (1, 'x')].into_iter().enumerate() {
                let slot = PERMISSION_SLOTS.get(who)?.get(perm)?;
                *chars.get_mut(*slot)? = if bits & mask == 0 { '-' } else { letter };
            }
        }
        return Some(chars.into_iter().collect());
    }

    let op_at = mode.find(['+', '-', '='])?;
    let (who_text, rest) = mode.split_at(op_at);
    let mut rest_chars = rest.chars();
    let op = rest_chars.next()?;
    let perms: Vec<char> = rest_chars.collect();
    if perms.is_empty() || !perms.iter().all(|p| matches!(p, 'r' | 'w' | 'x')) {
        return None;
    }
    let whos: Vec<usize> = if who_text.is_empty() || who_text == "a" {
        vec![0, 1, 2]
    } else {
        who_text
            .chars()
            .map(|c| match c {
                'u' => Some(0),
                'g' => Some(1),
                'o' => Some(2),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?
    };

    for who in whos {
        for (perm, letter) in ['r', 'w', 'x'].into_iter().enumerate() {
            let slot = PERMISSION_SLOTS.get(who)?.get(perm)?;
            let named = perms.contains(&letter);
            let cell = chars.get_mut(*slot)?;
            match op {
                '+' if named => *cell = letter,
                '-' if named => *cell = '-',
                '=' => *cell = if named { letter } else { '-' },
                _ => {}
            }
        }
    }
    Some(chars.into_iter().collect())
}

/// Shell-style glob with `*` and `?`.
fn glob_match(pattern: &str, name: &str) -> bool {
    fn matches(p: &[char], n: &[char]) -> bool {
        match p.split_first() {
            None => n.is_empty(),
            Some(('*', rest)) => (0..=n.len()).any(|i| n.get(i..).is_some_and(|t| matches(rest, t))),
            Some(('?', rest)) => n.split_first().is_some_and(|(_, t)| matches(rest, t)),
            Some((c, rest)) => n.split_first().is_some_and(|(h, t)| h == c && matches(rest, t)),
        }
    }
    let p: Vec<char> = pattern.chars().collect();
    let n: Vec<char> = name.chars().collect();
    matches(&p, &n)
}

/// Sizes as `du -h` prints them: one decimal below 10, whole numbers above.
fn human_size(bytes: u64) -> String {
    const UNITS: [(u64, &str); 3] = [(1_073_741_824, "G"), (1_048_576, "M"), (1024, "K")];
    for (unit, suffix) in UNITS {
        if bytes >= unit {
            let tenths = bytes.saturating_mul(10).checked_div(unit).unwrap_or(0);
            let whole = tenths.checked_div(10).unwrap_or(0);
            let frac = tenths.checked_rem(10).unwrap_or(0);
            return if whole < 10 {
                format!("{whole}.{frac}{suffix}")
            } else {
                format!("{whole}{suffix}")
            };
        }
    }
    bytes.to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn home() -> FileSystemWorld {
        FileSystemWorld::new(&FileSystemSnapshot {
            current_path: "/home/user".to_owned(),
            entries: vec![
                folder("Documents"),
                folder("Downloads"),
                file("notes.txt", 2048),
                file("config.txt", 512),
                FileEntry {
                    permissions: "-rwxr-xr-x".to_owned(),
                    ..file("script.sh", 1024)
                },
            ],
        })
    }

    fn names(world: &FileSystemWorld) -> Vec<String> {
        world.snapshot().entries.into_iter().map(|e| e.name).collect()
    }

    #[test]
    fn ls_lists_the_working_directory() {
        let mut world = home();
        let out = world.apply("ls");
        assert!(!out.mutated);
        assert_eq!(out.display, "Documents  Downloads  notes.txt  config.txt  script.sh");

        let long = world.apply("ls -la");
        assert!(long.display.contains("-rwxr-xr-x 1 user user   1024 script.sh"));
        assert!(long.display.starts_with("drwxr-xr-x"));
    }

    #[test]
    fn cd_moves_and_reports_missing_dirs() {
        let mut world = home();
        assert!(world.apply("cd Documents").mutated);
        assert_eq!(world.snapshot().current_path, "/home/user/Documents");
        assert_eq!(world.apply("pwd").display, "/home/user/Documents");

        world.apply("cd ..");
        assert_eq!(world.snapshot().current_path, "/home/user");

        let out = world.apply("cd Music");
        assert_eq!(out.display, "cd: Music: No such file or directory");
        assert!(!out.mutated);

        world.apply("cd /");
        world.apply("cd ~");
        assert_eq!(world.snapshot().current_path, "/home/user");
    }

    #[test]
    fn mkdir_touch_and_rm() {
        let mut world = home();
        assert!(world.apply("mkdir projects").mutated);
        assert!(names(&world).contains(&"projects".to_owned()));

        let again = world.apply("mkdir projects");
        assert!(again.display.contains("File exists"));

        world.apply("touch ./todo.md");
        assert!(names(&world).contains(&"todo.md".to_owned()));

        let dir = world.apply("rm projects");
        assert_eq!(dir.display, "rm: cannot remove 'projects': Is a directory");
        assert!(world.apply("rm -r projects").mutated);
        assert!(world.apply("rm todo.md").mutated);
        assert!(!names(&world).contains(&"todo.md".to_owned()));
    }

    #[test]
    fn cp_and_mv() {
        let mut world = home();
        world.apply("cp config.txt config_backup.txt");
        let after = names(&world);
        assert!(after.contains(&"config.txt".to_owned()));
        assert!(after.contains(&"config_backup.txt".to_owned()));

        world.apply("mv notes.txt Documents");
        assert!(!names(&world).contains(&"notes.txt".to_owned()));
        world.apply("cd Documents");
        assert_eq!(names(&world), vec!["notes.txt".to_owned()]);

        world.apply("mv notes.txt renamed.txt");
        assert_eq!(names(&world), vec!["renamed.txt".to_owned()]);
    }

    #[test]
    fn chmod_symbolic_and_octal() {
        let mut world = home();
        assert!(world.apply("chmod +x config.txt").mutated);
        let perms = |w: &FileSystemWorld, name: &str| {
            w.snapshot()
                .entries
                .into_iter()
                .find(|e| e.name == name)
                .unwrap()
                .permissions
        };
        assert_eq!(perms(&world, "config.txt"), "-rwxr-xr-x");

        world.apply("chmod 600 config.txt");
        assert_eq!(perms(&world, "config.txt"), "-rw-------");

        world.apply("chmod go+r config.txt");
        assert_eq!(perms(&world, "config.txt"), "-rw-r--r--");

        let bad = world.apply("chmod z+q config.txt");
        assert_eq!(bad.display, "chmod: invalid mode: 'z+q'");
    }

    #[test]
    fn pipelines_and_redirects() {
        let mut world = home();
        assert_eq!(world.apply("ls | wc -l").display, "5");
        assert_eq!(world.apply("ls -1 | grep txt | sort").display, "config.txt\nnotes.txt");

        let out = world.apply("ls > files.txt");
        assert!(out.mutated);
        assert!(names(&world).contains(&"files.txt".to_owned()));
        assert!(world.apply("cat files.txt").display.starts_with("Documents\nDownloads"));

        world.apply("echo done >> files.txt");
        assert_eq!(world.apply("tail -n 1 files.txt").display, "done");
    }

    #[test]
    fn find_matches_globs() {
        let mut world = home();
        world.apply("touch Documents/report.txt");
        let out = world.apply(r#"find . -name "*.txt""#);
        assert_eq!(
            out.display,
            "./Documents/report.txt\n./notes.txt\n./config.txt"
        );
        let dirs = world.apply("find . -type d");
        assert!(dirs.display.starts_with(".\n./Documents"));
    }

    #[test]
    fn transcript_only_commands() {
        let mut world = home();
        assert!(world.apply("ps aux").display.contains("PID"));
        assert_eq!(
            world.apply("sudo chown john notes.txt").display,
            "changed ownership of 'notes.txt' from user to john"
        );
        let du = world.apply("du -h");
        assert!(du.display.ends_with("\t."));
        assert!(du.display.contains("4.0K\t./Documents"));
        assert!(!du.mutated);
    }

    #[test]
    fn unknown_commands_leave_the_tree_alone() {
        let mut world = home();
        let before = world.clone();
        let out = world.apply("  frobnicate --all ");
        assert_eq!(out.display, "frobnicate --all: command not found");
        assert!(!out.mutated);
        assert_eq!(world, before);
    }

    #[test]
    fn glob_and_human_sizes() {
        assert!(glob_match("*.txt", "a.txt"));
        assert!(glob_match("file?.log", "file1.log"));
        assert!(!glob_match("*.txt", "a.md"));
        assert_eq!(human_size(4096), "4.0K");
        assert_eq!(human_size(102_400), "100K");
        assert_eq!(human_size(10), "10");
    }
}

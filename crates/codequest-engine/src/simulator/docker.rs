//! A local Docker engine: containers, images, volumes and networks.
//!
//! Commands are parsed into [`DockerCommand`] and dispatched against the
//! registry. Images are never fetched for `run`: the image must already be
//! local, otherwise the whole line is reported as an invalid command.

use std::hash::{DefaultHasher, Hash, Hasher};

use codequest_types::{Container, ContainerStatus, Image, RegistrySnapshot};
use serde_json::json;

use super::{CommandOutcome, tokenize};

/// Sizes reported for well-known images when they are pulled.
const KNOWN_IMAGE_SIZES: &[(&str, &str)] = &[
    ("nginx", "133MB"),
    ("postgres", "314MB"),
    ("redis", "28MB"),
    ("ubuntu", "72.8MB"),
    ("node", "910MB"),
    ("alpine", "7.05MB"),
    ("python", "1.01GB"),
    ("mysql", "577MB"),
];

const DEFAULT_IMAGE_SIZE: &str = "120MB";
const BUILT_IMAGE_SIZE: &str = "142MB";

/// Project name used for `compose up` when no compose file exists.
const COMPOSE_PROJECT: &str = "app";

/// Simulated Docker engine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryWorld {
    state: RegistrySnapshot,
}

impl RegistryWorld {
    /// Start from a level's engine state.
    pub fn new(snapshot: &RegistrySnapshot) -> Self {
        Self {
            state: snapshot.clone(),
        }
    }

    /// Current engine state.
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.state.clone()
    }

    /// Run one command line.
    pub fn apply(&mut self, input: &str) -> CommandOutcome {
        let invalid = || {
            CommandOutcome::output(format!(
                "Error: \"{}\" is not a valid Docker command",
                input.trim()
            ))
        };
        let Some(command) = parse(&tokenize(input)) else {
            return invalid();
        };
        if let DockerCommand::Run(spec) = &command
            && self.find_image(&spec.image).is_none()
        {
            return invalid();
        }
        self.dispatch(command)
    }

    fn dispatch(&mut self, command: DockerCommand) -> CommandOutcome {
        match command {
            DockerCommand::Pull(image) => self.pull(&image),
            DockerCommand::Run(spec) => self.run(spec),
            DockerCommand::List { all } => CommandOutcome::output(self.list(all)),
            DockerCommand::Stop(names) => self.set_status(&names, ContainerStatus::Exited, false),
            DockerCommand::Start(names) => self.set_status(&names, ContainerStatus::Running, false),
            DockerCommand::Restart(names) => {
                self.set_status(&names, ContainerStatus::Running, true)
            }
            DockerCommand::Remove { force, names } => self.remove_containers(force, &names),
            DockerCommand::Logs(name) => CommandOutcome::output(self.logs(&name)),
            DockerCommand::Exec { container, command } => {
                CommandOutcome::output(self.exec(&container, &command))
            }
            DockerCommand::Inspect(name) => CommandOutcome::output(self.inspect(&name)),
            DockerCommand::Images => CommandOutcome::output(self.images()),
            DockerCommand::RemoveImage { force, references } => {
                self.remove_images(force, &references)
            }
            DockerCommand::Build { tag } => self.build(tag),
            DockerCommand::Tag { source, target } => self.tag(&source, target),
            DockerCommand::VolumeCreate(name) => {
                let created = add_unique(&mut self.state.volumes, &name);
                CommandOutcome {
                    display: name,
                    mutated: created,
                }
            }
            DockerCommand::VolumeList => CommandOutcome::output(render_columns(
                &["DRIVER", "VOLUME NAME"],
                &self
                    .state
                    .volumes
                    .iter()
                    .map(|v| vec!["local".to_owned(), v.clone()])
                    .collect::<Vec<_>>(),
            )),
            DockerCommand::VolumeRemove(names) => self.remove_volumes(&names),
            DockerCommand::NetworkCreate(name) => {
                if self.state.networks.contains(&name) {
                    return CommandOutcome::output(format!(
                        "Error: network with name {name} already exists"
                    ));
                }
                self.state.networks.push(name.clone());
                CommandOutcome::changed(short_id(&name))
            }
            DockerCommand::NetworkList => CommandOutcome::output(render_columns(
                &["NETWORK ID", "NAME", "DRIVER"],
                &["bridge", "host", "none"]
                    .into_iter()
                    .map(str::to_owned)
                    .chain(self.state.networks.iter().cloned())
                    .map(|n| vec![short_id(&n), n, "bridge".to_owned()])
                    .collect::<Vec<_>>(),
            )),
            DockerCommand::ComposeUp { detached } => self.compose_up(detached),
            DockerCommand::ComposeDown => self.compose_down(),
        }
    }

    // -----------------------------------------------------------------------
    // Images
    // -----------------------------------------------------------------------

    /// Resolve a reference. Without a tag, `latest` is preferred, then any
    /// tag of that repository.
    fn find_image(&self, reference: &str) -> Option<&Image> {
        let wanted = ImageRef::parse(reference);
        let by_name = || self.state.images.iter().filter(|i| i.name == wanted.name);
        match &wanted.tag {
            Some(tag) => by_name().find(|i| &i.tag == tag),
            None => by_name()
                .find(|i| i.tag == "latest")
                .or_else(|| by_name().next()),
        }
    }

    fn pull(&mut self, image: &ImageRef) -> CommandOutcome {
        let tag = image.tag.clone().unwrap_or_else(|| "latest".to_owned());
        let reference = format!("{}:{tag}", image.name);
        if self.state.images.iter().any(|i| i.reference() == reference) {
            return CommandOutcome::output(format!(
                "{tag}: Pulling from library/{}\nStatus: Image is up to date for {reference}",
                image.name
            ));
        }
        let base = image.name.rsplit('/').next().unwrap_or(&image.name);
        let size = KNOWN_IMAGE_SIZES
            .iter()
            .find(|(name, _)| *name == base)
            .map_or(DEFAULT_IMAGE_SIZE, |(_, size)| *size);
        self.state.images.push(Image {
            name: image.name.clone(),
            tag: tag.clone(),
            size: size.to_owned(),
        });
        CommandOutcome::changed(format!(
            "{tag}: Pulling from library/{}\nDigest: sha256:{}\nStatus: Downloaded newer image for {reference}",
            image.name,
            short_id(&reference)
        ))
    }

    fn images(&self) -> String {
        let rows: Vec<Vec<String>> = self
            .state
            .images
            .iter()
            .map(|i| {
                vec![
                    i.name.clone(),
                    i.tag.clone(),
                    short_id(&i.reference()),
                    i.size.clone(),
                ]
            })
            .collect();
        render_columns(&["REPOSITORY", "TAG", "IMAGE ID", "SIZE"], &rows)
    }

    fn remove_images(&mut self, force: bool, references: &[String]) -> CommandOutcome {
        let mut lines = Vec::new();
        let mut mutated = false;
        for reference in references {
            let Some(resolved) = self.find_image(reference).map(Image::reference) else {
                lines.push(format!("Error: No such image: {reference}"));
                continue;
            };
            if !force
                && let Some(user) = self.state.containers.iter().find(|c| c.image == resolved)
            {
                lines.push(format!(
                    "Error: conflict: unable to remove repository reference \"{reference}\" (must force) - container {} is using its referenced image",
                    user.name
                ));
                continue;
            }
            self.state.images.retain(|i| i.reference() != resolved);
            lines.push(format!("Untagged: {resolved}"));
            mutated = true;
        }
        CommandOutcome {
            display: lines.join("\n"),
            mutated,
        }
    }

    fn build(&mut self, tag: Option<ImageRef>) -> CommandOutcome {
        let (name, tag) = tag.map_or_else(
            || ("<none>".to_owned(), "<none>".to_owned()),
            |t| (t.name, t.tag.unwrap_or_else(|| "latest".to_owned())),
        );
        let image = Image {
            name,
            tag,
            size: BUILT_IMAGE_SIZE.to_owned(),
        };
        let reference = image.reference();
        let id = short_id(&reference);
        put_image(&mut self.state.images, image);
        CommandOutcome::changed(format!(
            "Step 1/3 : FROM node:18\nStep 2/3 : COPY . /app\nStep 3/3 : CMD [\"npm\", \"start\"]\nSuccessfully built {id}\nSuccessfully tagged {reference}"
        ))
    }

    fn tag(&mut self, source: &str, target: ImageRef) -> CommandOutcome {
        let Some(size) = self.find_image(source).map(|i| i.size.clone()) else {
            return CommandOutcome::output(format!(
                "Error: No such image: {source}"
            ));
        };
        put_image(
            &mut self.state.images,
            Image {
                name: target.name,
                tag: target.tag.unwrap_or_else(|| "latest".to_owned()),
                size,
            },
        );
        CommandOutcome::changed("")
    }

    // -----------------------------------------------------------------------
    // Containers
    // -----------------------------------------------------------------------

    fn container(&self, name: &str) -> Option<&Container> {
        self.state.containers.iter().find(|c| c.name == name)
    }

    fn run(&mut self, spec: RunSpec) -> CommandOutcome {
        let Some(image) = self.find_image(&spec.image).map(Image::reference) else {
            return CommandOutcome::output(format!("Error: No such image: {}", spec.image));
        };
        let name = match spec.name {
            Some(name) if self.container(&name).is_some() => {
                return CommandOutcome::output(format!(
                    "Error: Conflict. The container name \"/{name}\" is already in use."
                ));
            }
            Some(name) => name,
            None => self.generated_name(&spec.image),
        };
        for volume in &spec.volumes {
            if let Some((source, _)) = volume.split_once(':')
                && !source.starts_with(['/', '.', '~'])
            {
                add_unique(&mut self.state.volumes, source);
            }
        }
        self.state.containers.push(Container {
            name: name.clone(),
            image,
            status: ContainerStatus::Running,
            ports: spec.ports.join(", "),
        });
        let id = short_id(&name);
        if spec.detached {
            CommandOutcome::changed(id)
        } else {
            CommandOutcome::changed(format!("Attached to {name} ({id})"))
        }
    }

    fn generated_name(&self, image: &str) -> String {
        let base: String = ImageRef::parse(image)
            .name
            .rsplit('/')
            .next()
            .unwrap_or("container")
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        let mut n = 1_usize;
        loop {
            let candidate = format!("{base}_{n}");
            if self.container(&candidate).is_none() {
                return candidate;
            }
            n = n.saturating_add(1);
        }
    }

    fn list(&self, all: bool) -> String {
        let rows: Vec<Vec<String>> = self
            .state
            .containers
            .iter()
            .filter(|c| all || c.status == ContainerStatus::Running)
            .map(|c| {
                let status = match c.status {
                    ContainerStatus::Running => "Up 2 minutes",
                    ContainerStatus::Exited => "Exited (0) 1 minute ago",
                };
                vec![
                    short_id(&c.name),
                    c.image.clone(),
                    status.to_owned(),
                    c.ports.clone(),
                    c.name.clone(),
                ]
            })
            .collect();
        render_columns(&["CONTAINER ID", "IMAGE", "STATUS", "PORTS", "NAMES"], &rows)
    }

    fn set_status(
        &mut self,
        names: &[String],
        status: ContainerStatus,
        always: bool,
    ) -> CommandOutcome {
        let mut lines = Vec::new();
        let mut mutated = false;
        for name in names {
            match self.state.containers.iter_mut().find(|c| &c.name == name) {
                Some(container) => {
                    if container.status != status {
                        container.status = status;
                        mutated = true;
                    } else if always {
                        mutated = true;
                    }
                    lines.push(name.clone());
                }
                None => lines.push(format!("Error: No such container: {name}")),
            }
        }
        CommandOutcome {
            display: lines.join("\n"),
            mutated,
        }
    }

    fn remove_containers(&mut self, force: bool, names: &[String]) -> CommandOutcome {
        let mut lines = Vec::new();
        let mut mutated = false;
        for name in names {
            match self.container(name).map(|c| c.status) {
                None => lines.push(format!("Error: No such container: {name}")),
                Some(ContainerStatus::Running) if !force => lines.push(format!(
                    "Error: You cannot remove a running container {name}. Stop the container before attempting removal or force remove"
                )),
                Some(_) => {
                    self.state.containers.retain(|c| &c.name != name);
                    lines.push(name.clone());
                    mutated = true;
                }
            }
        }
        CommandOutcome {
            display: lines.join("\n"),
            mutated,
        }
    }

    fn logs(&self, name: &str) -> String {
        let Some(container) = self.container(name) else {
            return format!("Error: No such container: {name}");
        };
        let base = ImageRef::parse(&container.image).name;
        let mut lines: Vec<String> = match base.rsplit('/').next().unwrap_or_default() {
            "nginx" => vec![
                "/docker-entrypoint.sh: Configuration complete; ready for start up".to_owned(),
                "nginx: [notice] 1#1: start worker processes".to_owned(),
                "172.17.0.1 - - \"GET / HTTP/1.1\" 200 615".to_owned(),
            ],
            "postgres" => vec![
                "LOG:  starting PostgreSQL 13".to_owned(),
                "LOG:  database system is ready to accept connections".to_owned(),
            ],
            "redis" => vec![
                "* Server initialized".to_owned(),
                "* Ready to accept connections tcp".to_owned(),
            ],
            _ => vec![format!("{name} started")],
        };
        if container.status == ContainerStatus::Exited {
            lines.push(format!("{name} exited with code 0"));
        }
        lines.join("\n")
    }

    fn exec(&self, name: &str, command: &[String]) -> String {
        let Some(container) = self.container(name) else {
            return format!("Error: No such container: {name}");
        };
        if container.status != ContainerStatus::Running {
            return format!("Error: container {name} is not running");
        }
        match command.first().map(String::as_str) {
            Some("bash" | "sh" | "/bin/bash" | "/bin/sh") => {
                format!("root@{}:/# ", short_id(name))
            }
            _ => format!("(ran `{}` in {name})", command.join(" ")),
        }
    }

    fn inspect(&self, name: &str) -> String {
        let value = if let Some(c) = self.container(name) {
            json!([{
                "Id": short_id(&c.name),
                "Name": format!("/{}", c.name),
                "Image": c.image,
                "State": {
                    "Status": c.status.to_string(),
                    "Running": c.status == ContainerStatus::Running,
                },
                "HostConfig": { "PortBindings": c.ports },
            }])
        } else if let Some(i) = self.find_image(name) {
            json!([{
                "Id": format!("sha256:{}", short_id(&i.reference())),
                "RepoTags": [i.reference()],
                "Size": i.size,
            }])
        } else if self.state.volumes.iter().any(|v| v == name) {
            json!([{
                "Name": name,
                "Driver": "local",
                "Mountpoint": format!("/var/lib/docker/volumes/{name}/_data"),
            }])
        } else {
            return format!("Error: No such object: {name}");
        };
        serde_json::to_string_pretty(&value).unwrap_or_default()
    }

    fn remove_volumes(&mut self, names: &[String]) -> CommandOutcome {
        let mut lines = Vec::new();
        let mut mutated = false;
        for name in names {
            if self.state.volumes.contains(name) {
                self.state.volumes.retain(|v| v != name);
                lines.push(name.clone());
                mutated = true;
            } else {
                lines.push(format!("Error: No such volume: {name}"));
            }
        }
        CommandOutcome {
            display: lines.join("\n"),
            mutated,
        }
    }

    // -----------------------------------------------------------------------
    // Compose
    // -----------------------------------------------------------------------

    /// Bring up a two-service stack: `web` on nginx and `db` on postgres.
    fn compose_up(&mut self, detached: bool) -> CommandOutcome {
        let network = format!("{COMPOSE_PROJECT}_default");
        let mut lines = Vec::new();
        if add_unique(&mut self.state.networks, &network) {
            lines.push(format!("Network {network}  Created"));
        }
        for (service, image, tag, ports) in [
            ("web", "nginx", "latest", "8080:80"),
            ("db", "postgres", "13", "5432/tcp"),
        ] {
            let reference = format!("{image}:{tag}");
            if !self.state.images.iter().any(|i| i.reference() == reference) {
                self.pull(&ImageRef::parse(&reference));
                lines.push(format!("{service} Pulled"));
            }
            let name = format!("{COMPOSE_PROJECT}-{service}-1");
            match self.state.containers.iter_mut().find(|c| c.name == name) {
                Some(container) => container.status = ContainerStatus::Running,
                None => {
                    self.state.containers.push(Container {
                        name: name.clone(),
                        image: reference,
                        status: ContainerStatus::Running,
                        ports: ports.to_owned(),
                    });
                    lines.push(format!("Container {name}  Created"));
                }
            }
            lines.push(format!("Container {name}  Started"));
        }
        if !detached {
            lines.push(format!(
                "Attaching to {COMPOSE_PROJECT}-web-1, {COMPOSE_PROJECT}-db-1"
            ));
        }
        CommandOutcome::changed(lines.join("\n"))
    }

    fn compose_down(&mut self) -> CommandOutcome {
        let prefix = format!("{COMPOSE_PROJECT}-");
        let network = format!("{COMPOSE_PROJECT}_default");
        let mut lines: Vec<String> = self
            .state
            .containers
            .iter()
            .filter(|c| c.name.starts_with(&prefix))
            .map(|c| format!("Container {}  Removed", c.name))
            .collect();
        self.state.containers.retain(|c| !c.name.starts_with(&prefix));
        if self.state.networks.contains(&network) {
            self.state.networks.retain(|n| n != &network);
            lines.push(format!("Network {network}  Removed"));
        }
        let mutated = !lines.is_empty();
        CommandOutcome {
            display: lines.join("\n"),
            mutated,
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// An image reference split into repository and optional tag.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ImageRef {
    name: String,
    tag: Option<String>,
}

impl ImageRef {
    /// `registry/name:tag`; a `:` before the last `/` is a registry port.
    fn parse(reference: &str) -> Self {
        match reference.rsplit_once(':') {
            Some((name, tag)) if !tag.contains('/') && !name.is_empty() => Self {
                name: name.to_owned(),
                tag: Some(tag.to_owned()),
            },
            _ => Self {
                name: reference.to_owned(),
                tag: None,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct RunSpec {
    detached: bool,
    name: Option<String>,
    ports: Vec<String>,
    volumes: Vec<String>,
    image: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DockerCommand {
    Pull(ImageRef),
    Run(RunSpec),
    List { all: bool },
    Stop(Vec<String>),
    Start(Vec<String>),
    Restart(Vec<String>),
    Remove { force: bool, names: Vec<String> },
    Logs(String),
    Exec { container: String, command: Vec<String> },
    Inspect(String),
    Images,
    RemoveImage { force: bool, references: Vec<String> },
    Build { tag: Option<ImageRef> },
    Tag { source: String, target: ImageRef },
    VolumeCreate(String),
    VolumeList,
    VolumeRemove(Vec<String>),
    NetworkCreate(String),
    NetworkList,
    ComposeUp { detached: bool },
    ComposeDown,
}

fn parse(words: &[String]) -> Option<DockerCommand> {
    let (program, args) = words.split_first()?;
    match program.as_str() {
        "docker-compose" => parse_compose(args),
        "docker" => {
            let (verb, rest) = args.split_first()?;
            match verb.as_str() {
                "container" => {
                    let (op, rest) = rest.split_first()?;
                    let op = match op.as_str() {
                        "ls" | "list" => "ps",
                        other @ ("run" | "stop" | "start" | "restart" | "rm" | "logs"
                        | "exec" | "inspect") => other,
                        _ => return None,
                    };
                    parse_verb(op, rest)
                }
                "image" => {
                    let (op, rest) = rest.split_first()?;
                    let op = match op.as_str() {
                        "ls" | "list" => "images",
                        "rm" => "rmi",
                        other @ ("pull" | "build" | "tag" | "inspect") => other,
                        _ => return None,
                    };
                    parse_verb(op, rest)
                }
                "volume" => parse_volume(rest),
                "network" => parse_network(rest),
                "compose" => parse_compose(rest),
                other => parse_verb(other, rest),
            }
        }
        _ => None,
    }
}

fn parse_verb(verb: &str, args: &[String]) -> Option<DockerCommand> {
    let (flags, operands) = split_flags(args);
    let only_flags = |allowed: &[&str]| flags.iter().all(|f| allowed.contains(&f.as_str()));
    let command = match verb {
        "pull" => match operands.as_slice() {
            [image] if flags.is_empty() => DockerCommand::Pull(ImageRef::parse(image)),
            _ => return None,
        },
        "run" => DockerCommand::Run(parse_run(args)?),
        "ps" if operands.is_empty() && only_flags(&["-a", "--all"]) => DockerCommand::List {
            all: !flags.is_empty(),
        },
        "stop" | "start" | "restart" if !operands.is_empty() && flags.is_empty() => match verb {
            "stop" => DockerCommand::Stop(operands),
            "start" => DockerCommand::Start(operands),
            _ => DockerCommand::Restart(operands),
        },
        "rm" if !operands.is_empty() && only_flags(&["-f", "--force"]) => DockerCommand::Remove {
            force: !flags.is_empty(),
            names: operands,
        },
        "logs" if only_flags(&["-f", "--follow"]) => match operands.as_slice() {
            [name] => DockerCommand::Logs(name.clone()),
            _ => return None,
        },
        "exec" => {
            let mut iter = args.iter().skip_while(|a| {
                matches!(a.as_str(), "-i" | "-t" | "-it" | "-ti" | "-d" | "--interactive" | "--tty")
            });
            let container = iter.next()?.clone();
            let command: Vec<String> = iter.cloned().collect();
            if command.is_empty() || container.starts_with('-') {
                return None;
            }
            DockerCommand::Exec { container, command }
        }
        "inspect" if flags.is_empty() => match operands.as_slice() {
            [name] => DockerCommand::Inspect(name.clone()),
            _ => return None,
        },
        "images" if operands.is_empty() && only_flags(&["-a", "--all"]) => DockerCommand::Images,
        "rmi" if !operands.is_empty() && only_flags(&["-f", "--force"]) => {
            DockerCommand::RemoveImage {
                force: !flags.is_empty(),
                references: operands,
            }
        }
        "build" => parse_build(args)?,
        "tag" if flags.is_empty() => match operands.as_slice() {
            [source, target] => DockerCommand::Tag {
                source: source.clone(),
                target: ImageRef::parse(target),
            },
            _ => return None,
        },
        _ => return None,
    };
    Some(command)
}

fn parse_run(args: &[String]) -> Option<RunSpec> {
    let mut spec = RunSpec::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if arg.starts_with("--") => (flag, Some(value.to_owned())),
            _ => (arg.as_str(), None),
        };
        let mut value = || inline.clone().or_else(|| iter.next().cloned());
        match flag {
            "-d" | "--detach" => spec.detached = true,
            "-it" | "-ti" | "-i" | "-t" | "--rm" | "--interactive" | "--tty" => {}
            "-dit" | "-itd" => spec.detached = true,
            "--name" => spec.name = Some(value()?),
            "-p" | "--publish" => spec.ports.push(value()?),
            "-v" | "--volume" => spec.volumes.push(value()?),
            "-e" | "--env" | "--network" | "-w" | "--workdir" => {
                value()?;
            }
            image if !image.starts_with('-') => {
                spec.image = image.to_owned();
                break;
            }
            _ => return None,
        }
    }
    (!spec.image.is_empty()).then_some(spec)
}

fn parse_build(args: &[String]) -> Option<DockerCommand> {
    let mut tag = None;
    let mut context = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-t" | "--tag" => tag = Some(ImageRef::parse(iter.next()?)),
            "-f" | "--file" => {
                iter.next()?;
            }
            other if other.starts_with("--tag=") => {
                tag = Some(ImageRef::parse(other.trim_start_matches("--tag=")));
            }
            other if !other.starts_with('-') && context.is_none() => context = Some(other),
            _ => return None,
        }
    }
    context?;
    Some(DockerCommand::Build { tag })
}

fn parse_volume(args: &[String]) -> Option<DockerCommand> {
    match args {
        [op, name] if op == "create" => Some(DockerCommand::VolumeCreate(name.clone())),
        [op] if op == "ls" => Some(DockerCommand::VolumeList),
        [op, names @ ..] if op == "rm" && !names.is_empty() => {
            Some(DockerCommand::VolumeRemove(names.to_vec()))
        }
        _ => None,
    }
}

fn parse_network(args: &[String]) -> Option<DockerCommand> {
    match args {
        [op, name] if op == "create" => Some(DockerCommand::NetworkCreate(name.clone())),
        [op] if op == "ls" => Some(DockerCommand::NetworkList),
        _ => None,
    }
}

fn parse_compose(args: &[String]) -> Option<DockerCommand> {
    match args {
        [op] if op == "up" => Some(DockerCommand::ComposeUp { detached: false }),
        [op, flag] if op == "up" && (flag == "-d" || flag == "--detach") => {
            Some(DockerCommand::ComposeUp { detached: true })
        }
        [op] if op == "down" => Some(DockerCommand::ComposeDown),
        _ => None,
    }
}

/// Split dash-prefixed flags from operands. Flags keep their dashes.
fn split_flags(args: &[String]) -> (Vec<String>, Vec<String>) {
    args.iter().cloned().partition(|a| a.starts_with('-'))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Push `value` unless present; returns whether it was added.
fn add_unique(list: &mut Vec<String>, value: &str) -> bool {
    if list.iter().any(|v| v == value) {
        return false;
    }
    list.push(value.to_owned());
    true
}

fn put_image(images: &mut Vec<Image>, image: Image) {
    match images.iter_mut().find(|i| i.reference() == image.reference()) {
        Some(slot) => *slot = image,
        None => images.push(image),
    }
}

/// A stable 12-hex-digit id derived from `seed`.
fn short_id(seed: &str) -> String {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    let hex = format!("{:016x}", hasher.finish());
    hex.chars().take(12).collect()
}

/// Left-aligned columns separated by three spaces, like the Docker CLI.
fn render_columns(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join("   ")
            .trim_end()
            .to_owned()
    };
    let header: Vec<String> = headers.iter().map(|h| (*h).to_owned()).collect();
    std::iter::once(line(header.as_slice()))
        .chain(rows.iter().map(|r| line(r.as_slice())))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn engine() -> RegistryWorld {
        RegistryWorld::new(&RegistrySnapshot {
            containers: vec![Container {
                name: "database".to_owned(),
                image: "postgres:13".to_owned(),
                status: ContainerStatus::Running,
                ports: "5432/tcp".to_owned(),
            }],
            images: vec![
                Image {
                    name: "nginx".to_owned(),
                    tag: "latest".to_owned(),
                    size: "133MB".to_owned(),
                },
                Image {
                    name: "postgres".to_owned(),
                    tag: "13".to_owned(),
                    size: "314MB".to_owned(),
                },
            ],
            volumes: Vec::new(),
            networks: Vec::new(),
        })
    }

    fn container<'a>(world: &'a RegistrySnapshot, name: &str) -> Option<&'a Container> {
        world.containers.iter().find(|c| c.name == name)
    }

    #[test]
    fn run_creates_a_running_container() {
        let mut world = engine();
        let out = world.apply("docker run -d --name web -p 8080:80 nginx");
        assert!(out.mutated);
        let snap = world.snapshot();
        let web = container(&snap, "web").unwrap();
        assert_eq!(web.status, ContainerStatus::Running);
        assert_eq!(web.image, "nginx:latest");
        assert_eq!(web.ports, "8080:80");
        assert_eq!(snap.containers.len(), 2);
    }

    #[test]
    fn run_with_unknown_image_is_invalid() {
        let mut world = engine();
        let before = world.clone();
        let out = world.apply("docker run web");
        assert_eq!(out.display, "Error: \"docker run web\" is not a valid Docker command");
        assert!(!out.mutated);
        assert_eq!(world, before);
    }

    #[test]
    fn run_name_conflict_and_generated_names() {
        let mut world = engine();
        let out = world.apply("docker run -d --name database postgres");
        assert!(out.display.contains("already in use"));

        world.apply("docker run -d -v mydata:/usr/share/nginx/html nginx");
        let snap = world.snapshot();
        assert!(container(&snap, "nginx_1").is_some());
        assert_eq!(snap.volumes, vec!["mydata".to_owned()]);
    }

    #[test]
    fn lifecycle_stop_start_rm() {
        let mut world = engine();
        assert_eq!(world.apply("docker stop database").display, "database");
        assert_eq!(
            container(&world.snapshot(), "database").map(|c| c.status),
            Some(ContainerStatus::Exited)
        );
        assert!(!world.apply("docker ps").display.contains("database"));
        assert!(world.apply("docker ps -a").display.contains("database"));

        world.apply("docker container start database");
        let refused = world.apply("docker rm database");
        assert!(refused.display.contains("cannot remove a running container"));
        assert!(!refused.mutated);

        assert!(world.apply("docker rm -f database").mutated);
        assert!(world.snapshot().containers.is_empty());

        let missing = world.apply("docker stop ghost");
        assert_eq!(missing.display, "Error: No such container: ghost");
    }

    #[test]
    fn pull_tag_and_remove_images() {
        let mut world = engine();
        assert!(world.apply("docker pull redis:alpine").mutated);
        assert!(!world.apply("docker pull nginx").mutated);

        world.apply("docker tag nginx:latest myregistry.com/nginx:v1");
        let images = world.apply("docker image ls").display;
        assert!(images.contains("myregistry.com/nginx"));
        assert!(images.contains("v1"));

        let blocked = world.apply("docker rmi postgres:13");
        assert!(blocked.display.contains("container database is using"));
        assert!(world.apply("docker rmi nginx:latest").mutated);
    }

    #[test]
    fn build_volume_network_and_compose() {
        let mut world = engine();
        let built = world.apply("docker build -t myapp:v1 .");
        assert!(built.display.ends_with("Successfully tagged myapp:v1"));

        assert_eq!(world.apply("docker volume create mydata").display, "mydata");
        assert!(world.apply("docker network create backend").mutated);

        world.apply("docker-compose up -d");
        let snap = world.snapshot();
        assert!(container(&snap, "app-web-1").is_some());
        assert!(snap.networks.contains(&"app_default".to_owned()));

        world.apply("docker compose down");
        assert!(container(&world.snapshot(), "app-web-1").is_none());
    }

    #[test]
    fn logs_exec_and_inspect() {
        let mut world = engine();
        assert!(world.apply("docker logs database").display.contains("ready to accept"));
        assert!(world.apply("docker exec -it database bash").display.starts_with("root@"));
        let inspected = world.apply("docker inspect database").display;
        assert!(inspected.contains("\"Name\": \"/database\""));
        assert!(inspected.contains("\"Running\": true"));
    }

    #[test]
    fn unknown_input_is_invalid() {
        let mut world = engine();
        for bad in ["docker", "docker fly", "podman ps", "docker ps --quiet"] {
            let out = world.apply(bad);
            assert_eq!(out.display, format!("Error: \"{bad}\" is not a valid Docker command"));
        }
    }

    #[test]
    fn image_references_parse_registry_ports() {
        assert_eq!(
            ImageRef::parse("localhost:5000/app"),
            ImageRef {
                name: "localhost:5000/app".to_owned(),
                tag: None
            }
        );
        assert_eq!(ImageRef::parse("nginx:1.25").tag.as_deref(), Some("1.25"));
    }
}

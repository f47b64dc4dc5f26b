use std::collections::BTreeMap;
use std::fmt;

use clap::Command;

use crate::errors::{CanvasDropError, Result};

/// Groups shown in help listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandCategory {
    Canvas,
    Cloud,
    Utility,
}

impl CommandCategory {
    /// Returns all category variants in display order.
    pub fn all() -> &'static [CommandCategory] {
        &[
            CommandCategory::Canvas,
            CommandCategory::Cloud,
            CommandCategory::Utility,
        ]
    }
}

impl fmt::Display for CommandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandCategory::Canvas => write!(f, "canvas"),
            CommandCategory::Cloud => write!(f, "cloud"),
            CommandCategory::Utility => write!(f, "utility"),
        }
    }
}

/// Metadata for a registered command.
#[derive(Debug, Clone)]
pub struct CommandMeta {
    pub name: String,
    pub category: CommandCategory,
    pub description: String,
    pub aliases: Vec<String>,
    pub command: Command,
}

/// Collects subcommands and attaches them to the root command.
pub struct CommandRegistry {
    commands: BTreeMap<String, CommandMeta>,
    root: Command,
}

impl CommandRegistry {
    pub fn new(root: Command) -> Self {
        Self {
            commands: BTreeMap::new(),
            root,
        }
    }

    /// Registers a command. Returns an error if a command with the same name already exists.
    pub fn register(&mut self, meta: CommandMeta) -> Result<()> {
        if self.commands.contains_key(&meta.name) {
            return Err(CanvasDropError::Command(format!(
                "duplicate command name: {}",
                meta.name
            )));
        }
        self.commands.insert(meta.name.clone(), meta);
        Ok(())
    }

    /// Commands in the given category, sorted by name.
    pub fn get_by_category(&self, cat: CommandCategory) -> Vec<&CommandMeta> {
        self.commands
            .values()
            .filter(|m| m.category == cat)
            .collect()
    }

    /// Consumes the registry and builds the final clap Command.
    ///
    /// Subcommands are attached in category order, then by name.
    pub fn build_root(self) -> Command {
        let mut root = self.root.clone();
        let mut order = 0;
        for cat in CommandCategory::all() {
            for meta in self.get_by_category(*cat) {
                root = root.subcommand(meta.command.clone().display_order(order));
                order += 1;
            }
        }
        root
    }
}

/// Builder for constructing `CommandMeta` instances.
pub struct CommandBuilder {
    name: String,
    category: Option<CommandCategory>,
    description: String,
    aliases: Vec<String>,
    command: Command,
}

impl CommandBuilder {
    /// Creates a builder from an existing clap Command, extracting name and description.
    pub fn from_clap(cmd: Command) -> Self {
        let name = cmd.get_name().to_string();
        let description = cmd
            .get_about()
            .map(|s| s.to_string())
            .unwrap_or_default();
        Self {
            name,
            category: None,
            description,
            aliases: Vec::new(),
            command: cmd,
        }
    }

    pub fn category(mut self, cat: CommandCategory) -> Self {
        self.category = Some(cat);
        self
    }

    pub fn aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Builds the `CommandMeta`. Defaults category to `Utility` if not set.
    ///
    /// Aliases are applied to the clap command as well.
    pub fn build(self) -> CommandMeta {
        let category = self.category.unwrap_or(CommandCategory::Utility);
        let mut command = self.command;
        if !self.aliases.is_empty() {
            command = command.visible_aliases(self.aliases.clone());
        }

        CommandMeta {
            name: self.name,
            category,
            description: self.description,
            aliases: self.aliases,
            command,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_root() -> Command {
        Command::new("canvas-drop")
    }

    fn make_meta(name: &str, cat: CommandCategory) -> CommandMeta {
        let cmd = Command::new(name.to_string()).about(format!("{} command", name));
        CommandBuilder::from_clap(cmd).category(cat).build()
    }

    fn subcommand_names(root: &Command) -> Vec<String> {
        root.get_subcommands()
            .map(|c| c.get_name().to_string())
            .collect()
    }

    #[test]
    fn test_register_and_lookup() {
        let mut reg = CommandRegistry::new(make_root());
        reg.register(make_meta("upload", CommandCategory::Canvas)).unwrap();
        reg.register(make_meta("courses", CommandCategory::Canvas)).unwrap();
        reg.register(make_meta("gdrive", CommandCategory::Cloud)).unwrap();

        let canvas: Vec<_> = reg
            .get_by_category(CommandCategory::Canvas)
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(canvas, vec!["courses", "upload"]);
        assert_eq!(reg.get_by_category(CommandCategory::Cloud)[0].name, "gdrive");
        assert!(reg.get_by_category(CommandCategory::Utility).is_empty());
    }

    #[test]
    fn test_duplicate_detection() {
        let mut reg = CommandRegistry::new(make_root());
        reg.register(make_meta("upload", CommandCategory::Canvas)).unwrap();
        let err = reg
            .register(make_meta("upload", CommandCategory::Canvas))
            .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_builder_from_clap() {
        let cmd = Command::new("upload").about("Upload a file");
        let meta = CommandBuilder::from_clap(cmd)
            .category(CommandCategory::Canvas)
            .aliases(&["up"])
            .build();

        assert_eq!(meta.name, "upload");
        assert_eq!(meta.description, "Upload a file");
        assert_eq!(meta.aliases, vec!["up"]);
        assert_eq!(meta.category, CommandCategory::Canvas);
        assert!(meta.command.get_visible_aliases().any(|a| a == "up"));
    }

    #[test]
    fn test_builder_defaults() {
        let meta = CommandBuilder::from_clap(Command::new("test-cmd")).build();
        assert_eq!(meta.category, CommandCategory::Utility);
        assert!(meta.description.is_empty());
        assert!(meta.aliases.is_empty());
    }

    #[test]
    fn test_build_root_orders_by_category() {
        let mut reg = CommandRegistry::new(make_root());
        reg.register(make_meta("settings", CommandCategory::Utility)).unwrap();
        reg.register(make_meta("gdrive", CommandCategory::Cloud)).unwrap();
        reg.register(make_meta("upload", CommandCategory::Canvas)).unwrap();

        let root = reg.build_root();
        assert_eq!(subcommand_names(&root), vec!["upload", "gdrive", "settings"]);
    }
}

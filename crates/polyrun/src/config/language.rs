use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the compiled artifact inside a job directory
pub const ARTIFACT_NAME: &str = if cfg!(windows) {
    "program.exe"
} else {
    "program"
};

/// Interpreter used for Python sources
pub const PYTHON_COMMAND: &str = if cfg!(windows) { "python" } else { "python3" };

static JAVA_PUBLIC_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)public\s+class\s+(\w+)").expect("java class pattern should compile")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported language '{0}'")]
pub struct UnsupportedLanguage(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no public class found in Java code")]
pub struct MissingPublicClass;

/// A supported source language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Python,
    C,
    #[serde(rename = "C++")]
    Cpp,
    Java,
    JavaScript,
    Go,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::Python,
        Language::C,
        Language::Cpp,
        Language::Java,
        Language::JavaScript,
        Language::Go,
    ];

    /// Name used on the wire (e.g. "C++")
    pub fn name(self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::C => "C",
            Language::Cpp => "C++",
            Language::Java => "Java",
            Language::JavaScript => "JavaScript",
            Language::Go => "Go",
        }
    }

    /// Key used for this language in configuration files
    pub fn id(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Java => "java",
            Language::JavaScript => "javascript",
            Language::Go => "go",
        }
    }

    /// File extension without dot
    pub fn extension(self) -> &'static str {
        match self {
            Language::Python => "py",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Java => "java",
            Language::JavaScript => "js",
            Language::Go => "go",
        }
    }

    fn index(self) -> usize {
        match self {
            Language::Python => 0,
            Language::C => 1,
            Language::Cpp => 2,
            Language::Java => 3,
            Language::JavaScript => 4,
            Language::Go => 5,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.name() == s)
            .ok_or_else(|| UnsupportedLanguage(s.to_owned()))
    }
}

/// Find the first `public class <Name>` declaration in Java source text
pub fn java_public_class(code: &str) -> Option<&str> {
    JAVA_PUBLIC_CLASS
        .captures(code)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Source file name chosen for a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceName {
    /// File name inside the job directory (e.g. "program.py", "Main.java")
    pub file_name: String,

    /// Class to launch, for languages that need one
    pub class_name: Option<String>,
}

/// Values substituted into command templates
#[derive(Debug, Clone, Copy)]
pub struct Placeholders<'a> {
    pub source: &'a Path,
    pub output: &'a Path,
    pub dir: &'a Path,
    pub class: Option<&'a str>,
}

/// Replacement argv for one language's recipe
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeOverride {
    /// Compile command and arguments with placeholders
    #[serde(default)]
    pub compile: Option<Vec<String>>,

    /// Run command and arguments with placeholders
    #[serde(default)]
    pub run: Option<Vec<String>>,
}

/// Per-language recipe overrides from the `[toolchains]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainOverrides {
    #[serde(default)]
    pub python: Option<RecipeOverride>,
    #[serde(default)]
    pub c: Option<RecipeOverride>,
    #[serde(default)]
    pub cpp: Option<RecipeOverride>,
    #[serde(default)]
    pub java: Option<RecipeOverride>,
    #[serde(default)]
    pub javascript: Option<RecipeOverride>,
    #[serde(default)]
    pub go: Option<RecipeOverride>,
}

impl ToolchainOverrides {
    pub fn get(&self, language: Language) -> Option<&RecipeOverride> {
        match language {
            Language::Python => self.python.as_ref(),
            Language::C => self.c.as_ref(),
            Language::Cpp => self.cpp.as_ref(),
            Language::Java => self.java.as_ref(),
            Language::JavaScript => self.javascript.as_ref(),
            Language::Go => self.go.as_ref(),
        }
    }

    pub fn set(&mut self, language: Language, recipe: RecipeOverride) {
        let slot = match language {
            Language::Python => &mut self.python,
            Language::C => &mut self.c,
            Language::Cpp => &mut self.cpp,
            Language::Java => &mut self.java,
            Language::JavaScript => &mut self.javascript,
            Language::Go => &mut self.go,
        };
        *slot = Some(recipe);
    }
}

/// Build and run recipe for one language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    language: Language,
    compile: Option<Vec<String>>,
    run: Vec<String>,
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| (*s).to_owned()).collect()
}

impl Toolchain {
    /// The recipe used when configuration does not override it
    pub fn builtin(language: Language) -> Self {
        let (compile, run) = match language {
            Language::Python => (None, argv(&[PYTHON_COMMAND, "{source}"])),
            Language::C => (
                Some(argv(&["gcc", "-Wall", "{source}", "-o", "{output}"])),
                argv(&["{output}"]),
            ),
            Language::Cpp => (
                Some(argv(&["g++", "-Wall", "{source}", "-o", "{output}"])),
                argv(&["{output}"]),
            ),
            Language::Java => (
                Some(argv(&["javac", "{source}"])),
                argv(&["java", "-cp", "{dir}", "{class}"]),
            ),
            Language::JavaScript => (None, argv(&["node", "{source}"])),
            Language::Go => (
                Some(argv(&["go", "build", "-o", "{output}", "{source}"])),
                argv(&["{output}"]),
            ),
        };
        Self {
            language,
            compile,
            run,
        }
    }

    /// Replace the parts of this recipe that the override sets
    pub fn with_override(mut self, recipe: &RecipeOverride) -> Self {
        if let Some(ref compile) = recipe.compile {
            self.compile = Some(compile.clone());
        }
        if let Some(ref run) = recipe.run {
            self.run = run.clone();
        }
        self
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Check if the recipe has a compile step
    pub fn is_compiled(&self) -> bool {
        self.compile.is_some()
    }

    pub fn compile_template(&self) -> Option<&[String]> {
        self.compile.as_deref()
    }

    pub fn run_template(&self) -> &[String] {
        &self.run
    }

    /// Pick the source file name for `code`
    ///
    /// Java sources are named after their public class, so a submission
    /// without one cannot be staged.
    pub fn source_name(&self, code: &str) -> Result<SourceName, MissingPublicClass> {
        match self.language {
            Language::Java => {
                let class = java_public_class(code).ok_or(MissingPublicClass)?;
                Ok(SourceName {
                    file_name: format!("{class}.java"),
                    class_name: Some(class.to_owned()),
                })
            }
            other => Ok(SourceName {
                file_name: format!("program.{}", other.extension()),
                class_name: None,
            }),
        }
    }

    /// Expanded compile argv, if the recipe has a compile step
    pub fn compile_command(&self, values: &Placeholders<'_>) -> Option<Vec<String>> {
        self.compile
            .as_ref()
            .map(|template| expand_command(template, values))
    }

    /// Expanded run argv
    pub fn run_command(&self, values: &Placeholders<'_>) -> Vec<String> {
        expand_command(&self.run, values)
    }
}

/// Expand placeholders in the given command
pub fn expand_command(command: &[String], values: &Placeholders<'_>) -> Vec<String> {
    let source = values.source.to_string_lossy();
    let output = values.output.to_string_lossy();
    let dir = values.dir.to_string_lossy();
    let class = values.class.unwrap_or_default();
    command
        .iter()
        .map(|arg| {
            arg.replace("{source}", &source)
                .replace("{output}", &output)
                .replace("{dir}", &dir)
                .replace("{class}", class)
        })
        .collect()
}

/// Toolchains for every supported language, fixed after construction
#[derive(Debug, Clone)]
pub struct ToolchainRegistry {
    toolchains: [Toolchain; 6],
}

impl ToolchainRegistry {
    pub fn new(overrides: &ToolchainOverrides) -> Self {
        let toolchains = Language::ALL.map(|language| {
            let builtin = Toolchain::builtin(language);
            match overrides.get(language) {
                Some(recipe) => builtin.with_override(recipe),
                None => builtin,
            }
        });
        Self { toolchains }
    }

    pub fn get(&self, language: Language) -> &Toolchain {
        &self.toolchains[language.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toolchain> {
        self.toolchains.iter()
    }
}

impl Default for ToolchainRegistry {
    fn default() -> Self {
        Self::new(&ToolchainOverrides::default())
    }
}

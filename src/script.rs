//! Typed PowerShell statements and their renderer
//!
//! Repositories never format command text themselves. They assemble a
//! [`Script`] of [`Statement`]s and the renderer here does all quoting,
//! so escaping rules live in one place.

use crate::codec::{self, duration, Granularity};
use crate::models::{Binding, Protocol};

/// Account granted access to freshly created content directories
pub const CONTENT_ACCOUNT: &str = "IIS_IUSRS";

const JSON_DEPTH: u8 = 4;

/// Single-quoted PowerShell literal. PowerShell also treats typographic
/// quotes as quote characters, so those get doubled too.
pub fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if matches!(c, '\'' | '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}') {
            quoted.push(c);
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

/// IIS expects backslash separators in physical paths
pub fn windows_path(path: &str) -> String {
    path.replace('/', "\\")
}

/// A property value in a `Set-ItemProperty` statement
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Int(i64),
    Bool(bool),
    Duration(u32, Granularity),
}

impl Value {
    fn render(&self) -> String {
        match self {
            Value::Text(text) => quote(text),
            Value::Int(n) => n.to_string(),
            Value::Bool(flag) => quote(codec::pascal_case(*flag)),
            Value::Duration(count, granularity) => quote(&duration::encode(*count, *granularity)),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

/// Location of an object in the `IIS:` drive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemPath {
    AppPool(String),
    Site(String),
    Application { site: String, name: String },
}

impl std::fmt::Display for ItemPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemPath::AppPool(name) => write!(f, r"IIS:\AppPools\{}", name),
            ItemPath::Site(name) => write!(f, r"IIS:\Sites\{}", name),
            ItemPath::Application { site, name } => {
                write!(f, r"IIS:\Sites\{}\{}", site, windows_path(name))
            }
        }
    }
}

/// Read commands, serialized to compact JSON
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    AppPool(String),
    WebSite(String),
    WebApplication { site: String, name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    ImportWebAdministration,
    Query(Query),
    SetProperty {
        path: ItemPath,
        property: &'static str,
        value: Value,
    },
    /// Create the directory when missing and grant [`CONTENT_ACCOUNT`] full control
    EnsureDirectory(String),
    NewAppPool(String),
    /// New site listening on `binding`, or on IIS's default `*:80` without one
    NewWebSite {
        name: String,
        physical_path: String,
        binding: Option<Binding>,
    },
    NewWebApplication {
        site: String,
        name: String,
        application_pool: String,
        physical_path: String,
    },
    RemoveAppPool(String),
    RemoveWebSite(String),
    RemoveWebApplication {
        site: String,
        name: String,
    },
    RemoveBindings(String),
    AddBinding {
        site: String,
        binding: Binding,
    },
}

impl Statement {
    pub fn set(path: &ItemPath, property: &'static str, value: impl Into<Value>) -> Self {
        Statement::SetProperty {
            path: path.clone(),
            property,
            value: value.into(),
        }
    }

    pub fn render(&self) -> String {
        match self {
            Statement::ImportWebAdministration => "Import-Module WebAdministration;".to_string(),
            Statement::Query(query) => render_query(query),
            Statement::SetProperty { path, property, value } => format!(
                "Set-ItemProperty -Path {} -Name {} -Value {};",
                quote(&path.to_string()),
                quote(property),
                value.render()
            ),
            Statement::EnsureDirectory(path) => {
                let path = quote(&windows_path(path));
                format!(
                    "if (!(Test-Path -LiteralPath {path})) {{ New-Item -ItemType Directory -Path {path} | Out-Null; icacls {path} /grant {grant} /T | Out-Null }};",
                    path = path,
                    grant = quote(&format!("{}:(OI)(CI)F", CONTENT_ACCOUNT)),
                )
            }
            Statement::NewAppPool(name) => format!("New-WebAppPool -Name {} | Out-Null;", quote(name)),
            Statement::NewWebSite {
                name,
                physical_path,
                binding,
            } => {
                let listen = binding.as_ref().map_or_else(String::new, |b| {
                    format!(
                        " -IPAddress {} -Port {} -HostHeader {}{}",
                        quote(&b.ip),
                        b.port,
                        quote(&b.host_header),
                        if b.protocol == Protocol::Https { " -Ssl" } else { "" }
                    )
                });
                format!(
                    "New-Website -Name {} -PhysicalPath {}{} | Out-Null;",
                    quote(name),
                    quote(&windows_path(physical_path)),
                    listen
                )
            }
            Statement::NewWebApplication {
                site,
                name,
                application_pool,
                physical_path,
            } => format!(
                "New-WebApplication -Site {} -Name {} -ApplicationPool {} -PhysicalPath {} | Out-Null;",
                quote(site),
                quote(name),
                quote(application_pool),
                quote(&windows_path(physical_path))
            ),
            Statement::RemoveAppPool(name) => format!("Remove-WebAppPool -Name {};", quote(name)),
            Statement::RemoveWebSite(name) => format!("Remove-Website -Name {};", quote(name)),
            Statement::RemoveWebApplication { site, name } => format!(
                "Remove-WebApplication -Site {} -Name {};",
                quote(site),
                quote(name)
            ),
            Statement::RemoveBindings(site) => format!(
                "Get-WebBinding -Name {site} | Where-Object {{ $_.protocol -in 'http','https' }} | ForEach-Object {{ Remove-WebBinding -Name {site} -BindingInformation $_.bindingInformation -Protocol $_.protocol }};",
                site = quote(site)
            ),
            Statement::AddBinding { site, binding } => format!(
                "New-WebBinding -Name {} -IPAddress {} -Port {} -HostHeader {} -Protocol {};",
                quote(site),
                quote(&binding.ip),
                binding.port,
                quote(&binding.host_header),
                quote(binding.protocol.as_str())
            ),
        }
    }
}

fn render_query(query: &Query) -> String {
    let select = match query {
        Query::AppPool(name) => format!(
            "Get-IISAppPool -Name {} -WarningAction SilentlyContinue",
            quote(name)
        ),
        // Get-Website -Name matches loosely on some hosts, so filter exactly
        Query::WebSite(name) => format!(
            "Get-Website | Where-Object {{ $_.Name -eq {} }}",
            quote(name)
        ),
        Query::WebApplication { site, name } => format!(
            "Get-WebApplication -Site {} -Name {}",
            quote(site),
            quote(name)
        ),
    };
    format!("{} | ConvertTo-Json -Compress -Depth {}", select, JSON_DEPTH)
}

/// An ordered list of statements executed as one PowerShell script
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    statements: Vec<Statement>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script for property writes through the `IIS:` drive
    pub fn web_administration() -> Self {
        Self::new().with(Statement::ImportWebAdministration)
    }

    pub fn with(mut self, statement: Statement) -> Self {
        self.statements.push(statement);
        self
    }

    pub fn push(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn render(&self) -> String {
        self.statements
            .iter()
            .map(Statement::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<Statement> for Script {
    fn from(statement: Statement) -> Self {
        Script::new().with(statement)
    }
}

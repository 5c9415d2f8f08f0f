use console::style;
use layerprep_core::IngestError;
use std::fmt;
use std::path::Path;

/// User-facing error with context and suggestions
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
            help_command: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }

    /// Machine-readable form for `--json` runs
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "status": "error",
            "message": self.message,
            "context": self.context,
            "suggestions": self.suggestions,
        })
    }

    pub fn display_json(&self) {
        eprintln!("{:#}", self.to_json());
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Create error for a missing archive path
pub fn archive_not_found(path: &Path) -> CliError {
    CliError::new("Archive file not found")
        .with_context(format!("The specified archive does not exist.\n\nPath: {}", path.display()))
        .with_suggestion("Check the file path and try again")
        .with_suggestion("Use absolute path or path relative to current directory")
        .with_help("Run: layerprep --help")
}

/// Create error for a configuration file that does not exist
pub fn config_file_not_found(path: &Path) -> CliError {
    CliError::new("Configuration file not found")
        .with_context(format!("Path: {}", path.display()))
        .with_suggestion("Check the --config path")
        .with_suggestion("Or omit --config to use defaults and LAYERPREP_* environment variables")
        .with_help("Run: layerprep config")
}

/// Create error for an unreadable target schema file
pub fn schema_file_invalid(path: &Path, reason: &str) -> CliError {
    CliError::new("Invalid target schema file")
        .with_context(format!("Path: {}\n\nError: {}", path.display(), reason))
        .with_suggestion(
            "The schema must be a JSON array such as [{\"name\": \"town\", \"nullable\": false}]",
        )
        .with_suggestion("Field \"type\" is optional; \"nullable\" defaults to true")
        .with_help("Run: layerprep compare --help")
}

/// Create error for an unreadable mapping file
pub fn mapping_file_invalid(path: &Path, reason: &str) -> CliError {
    CliError::new("Invalid field mapping file")
        .with_context(format!("Path: {}\n\nError: {}", path.display(), reason))
        .with_suggestion("The mapping must be a JSON object such as {\"TOWN_NM\": \"town\"}")
        .with_suggestion("Or omit --mapping to use the suggested mapping")
        .with_help("Run: layerprep map --help")
}

/// Create error for invalid configuration
pub fn invalid_config(key: &str, reason: &str) -> CliError {
    CliError::new(format!("Invalid configuration: {}", key))
        .with_context(format!("Configuration value is invalid.\n\nReason: {}", reason))
        .with_suggestion("Check the --config file for syntax errors")
        .with_suggestion("Check LAYERPREP_* environment variables")
        .with_help("Run: layerprep config")
}

/// Convert a pipeline error into a CliError with suggestions
pub fn from_ingest(error: &IngestError) -> CliError {
    match error {
        IngestError::Archive { reason } => CliError::new("Invalid shapefile archive")
            .with_context(format!("Reason: {}", reason))
            .with_suggestion("Make sure the zip contains .shp and .shx files with the same base name")
            .with_suggestion("Include the .dbf and .prj files so attributes and CRS are kept")
            .with_help("Run: layerprep check <archive>"),
        IngestError::NoFeatures
        | IngestError::NoGeometry
        | IngestError::AllGeometryNull { .. } => CliError::new("Shapefile has no usable features")
            .with_context(format!("Reason: {}", error))
            .with_suggestion("Open the layer in a desktop GIS and confirm its features have shapes")
            .with_suggestion("Re-export the layer and upload the new archive"),
        IngestError::MixedGeometryFamily { .. } => CliError::new("Mixed geometry types")
            .with_context(format!("Reason: {}", error))
            .with_suggestion("Split the layer by geometry type and upload each part separately"),
        IngestError::Shapefile { .. } => CliError::new("Shapefile could not be read")
            .with_context(format!("Reason: {}", error))
            .with_suggestion("Check that the archive is not truncated")
            .with_suggestion("Re-export the shapefile from its source application"),
        IngestError::Reprojection { .. } => CliError::new("Reprojection failed")
            .with_context(format!("Reason: {}", error))
            .with_suggestion("Check the .prj file in the archive")
            .with_suggestion("Or pick another target with --target-crs"),
        IngestError::EmptyMapping | IngestError::InvalidMapping { .. } => {
            CliError::new("Field mapping cannot be applied")
                .with_context(format!("Reason: {}", error))
                .with_suggestion("Map at least one source field to a distinct target field")
                .with_suggestion("Compare the schemas first: layerprep compare <archive> --schema <file>")
                .with_help("Run: layerprep map --help")
        }
        IngestError::ConfigInvalid { key, reason } => invalid_config(key, reason),
        IngestError::Io(_) | IngestError::Serialization(_) => {
            CliError::new(error.to_string()).with_suggestion("Check file paths and permissions")
        }
    }
}

/// Convert anyhow::Error to CliError with context
pub fn from_anyhow(error: anyhow::Error) -> CliError {
    if let Some(ingest) = error.downcast_ref::<IngestError>() {
        return from_ingest(ingest);
    }

    let message = error.to_string();

    if message.contains("No such file or directory") {
        CliError::new("File not found")
            .with_context(format!("Error: {}", message))
            .with_suggestion("Check the file path and try again")
    } else if message.to_lowercase().contains("permission denied") {
        CliError::new("Permission denied")
            .with_context(format!("Error: {}", message))
            .with_suggestion("Check file permissions")
            .with_suggestion("Or run with appropriate privileges")
    } else {
        CliError::new(message)
    }
}

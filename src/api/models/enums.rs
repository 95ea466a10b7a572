use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Status a stored document carries once it has been soft-deleted.
///
/// Never part of the editable schema; reads treat such rows as absent.
pub const DELETED_STATUS: &str = "deleted";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UseCaseStatus {
    #[default]
    Draft,
    Review,
    Approved,
    Rejected,
}

impl UseCaseStatus {
    pub const ALL: [UseCaseStatus; 4] = [
        UseCaseStatus::Draft,
        UseCaseStatus::Review,
        UseCaseStatus::Approved,
        UseCaseStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UseCaseStatus::Draft => "draft",
            UseCaseStatus::Review => "review",
            UseCaseStatus::Approved => "approved",
            UseCaseStatus::Rejected => "rejected",
        }
    }

    /// Display label shown in listings and previews.
    pub fn label(&self) -> &'static str {
        match self {
            UseCaseStatus::Draft => "Borrador",
            UseCaseStatus::Review => "En Revisión",
            UseCaseStatus::Approved => "Aprobado",
            UseCaseStatus::Rejected => "Rechazado",
        }
    }
}

impl fmt::Display for UseCaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UseCaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(UseCaseStatus::Draft),
            "review" => Ok(UseCaseStatus::Review),
            "approved" => Ok(UseCaseStatus::Approved),
            "rejected" => Ok(UseCaseStatus::Rejected),
            other => Err(format!("unknown use case status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FlowType {
    #[default]
    Main,
    Alternative,
    Exception,
}

impl FlowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowType::Main => "main",
            FlowType::Alternative => "alternative",
            FlowType::Exception => "exception",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FlowType::Main => "Principal",
            FlowType::Alternative => "Alternativo",
            FlowType::Exception => "Excepción",
        }
    }
}

impl fmt::Display for FlowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" => Ok(FlowType::Main),
            "alternative" => Ok(FlowType::Alternative),
            "exception" => Ok(FlowType::Exception),
            other => Err(format!("unknown flow type: {other}")),
        }
    }
}

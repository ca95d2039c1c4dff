use serde::Serialize;

use crate::service::ServiceError;
use crate::store::Table;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    List,
    Get,
    Update,
    Delete,
}

impl Operation {
    fn verb(&self) -> &'static str {
        match self {
            Operation::Create => "creating",
            Operation::List | Operation::Get => "fetching",
            Operation::Update => "updating",
            Operation::Delete => "deleting",
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Uniform result shape handed back to callers.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Envelope {
    pub status: Status,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    pub fn success(operation: Operation, table: Table) -> Self {
        let label = capitalize(table.label());
        let message = match operation {
            Operation::Create => format!("{label} created successfully"),
            Operation::List => format!("All {} found", table.plural()),
            Operation::Get => format!("{label} found"),
            Operation::Update => format!("{label} updated"),
            Operation::Delete => format!("{label} deleted"),
        };
        Self {
            status: Status::Success,
            message,
            data: None,
            error: None,
        }
    }

    pub fn with_data<T: Serialize>(mut self, data: &T) -> Result<Self, serde_json::Error> {
        self.data = Some(serde_json::to_value(data)?);
        Ok(self)
    }

    pub fn failure(operation: Operation, table: Table, err: &ServiceError) -> Self {
        let message = match err {
            ServiceError::NotFound { entity, .. } => format!("{} not found", capitalize(entity)),
            ServiceError::Validation(_) => format!("Invalid {} request", table.label()),
            ServiceError::Conflict(_) => {
                format!("{} references a missing record", capitalize(table.label()))
            }
            ServiceError::Store(_) => {
                let subject = match operation {
                    Operation::List => table.plural(),
                    _ => table.label(),
                };
                format!("Error {} {subject}", operation.verb())
            }
        };
        Self {
            status: Status::Error,
            message,
            data: None,
            error: Some(err.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

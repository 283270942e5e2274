//! Request and response schemas of the wire protocol.
//!
//! Every schema is built once, on first use, and shared for the life of the
//! process. Messages are looked up by [`ApiKey`] and version.
use std::{
    fmt,
    str::FromStr,
    sync::{Arc, LazyLock},
};

use log::debug;
use thiserror::Error;

use super::types::{Field, Schema, Type};

fn schema(name: &str, fields: Vec<Field>) -> Arc<Schema> {
    let schema = Schema::new(fields).expect("catalogue schemas have unique field names");
    debug!("built schema {name}: {schema}");
    Arc::new(schema)
}

fn nested(schema: &LazyLock<Arc<Schema>>) -> Type {
    Type::Schema(Arc::clone(LazyLock::force(schema)))
}

pub static REQUEST_HEADER: LazyLock<Arc<Schema>> = LazyLock::new(|| {
    schema(
        "request_header",
        vec![
            Field::new("api_key", Type::Int16, "The id of the request type."),
            Field::new("api_version", Type::Int16, "The version of the API."),
            Field::new(
                "correlation_id",
                Type::Int32,
                "A user-supplied integer value that will be passed back with the response",
            ),
            Field::new(
                "client_id",
                Type::String,
                "A user specified identifier for the client making the request.",
            ),
        ],
    )
});

pub static RESPONSE_HEADER: LazyLock<Arc<Schema>> = LazyLock::new(|| {
    schema(
        "response_header",
        vec![Field::new(
            "correlation_id",
            Type::Int32,
            "The user-supplied value passed in with the request",
        )],
    )
});

pub static METADATA_REQUEST_V0: LazyLock<Arc<Schema>> = LazyLock::new(|| {
    schema(
        "metadata_request_v0",
        vec![Field::new(
            "topics",
            Type::array_of(Type::String),
            "An array of topics to fetch metadata for. If no topics are specified fetch metadata for all topics.",
        )],
    )
});

pub static BROKER: LazyLock<Arc<Schema>> = LazyLock::new(|| {
    schema(
        "broker",
        vec![
            Field::new("node_id", Type::Int32, "The broker id."),
            Field::new("host", Type::String, "The hostname of the broker."),
            Field::new(
                "port",
                Type::Int32,
                "The port on which the broker accepts requests.",
            ),
        ],
    )
});

pub static PARTITION_METADATA_V0: LazyLock<Arc<Schema>> = LazyLock::new(|| {
    schema(
        "partition_metadata_v0",
        vec![
            Field::new(
                "partition_error_code",
                Type::Int16,
                "The error code for the partition, if any.",
            ),
            Field::new("partition_id", Type::Int32, "The id of the partition."),
            Field::new(
                "leader",
                Type::Int32,
                "The id of the broker acting as leader for this partition.",
            ),
            Field::new(
                "replicas",
                Type::array_of(Type::Int32),
                "The set of all nodes that host this partition.",
            ),
            Field::new(
                "isr",
                Type::array_of(Type::Int32),
                "The set of nodes that are in sync with the leader for this partition.",
            ),
        ],
    )
});

pub static TOPIC_METADATA_V0: LazyLock<Arc<Schema>> = LazyLock::new(|| {
    schema(
        "topic_metadata_v0",
        vec![
            Field::new(
                "topic_error_code",
                Type::Int16,
                "The error code for the given topic.",
            ),
            Field::new("topic_name", Type::String, "The name of the topic"),
            Field::new(
                "partition_metadata",
                Type::array_of(nested(&PARTITION_METADATA_V0)),
                "Metadata for each partition of the topic.",
            ),
        ],
    )
});

pub static METADATA_RESPONSE_V0: LazyLock<Arc<Schema>> = LazyLock::new(|| {
    schema(
        "metadata_response_v0",
        vec![
            Field::new(
                "brokers",
                Type::array_of(nested(&BROKER)),
                "Host and port information for all brokers.",
            ),
            Field::new(
                "topic_metadata",
                Type::array_of(nested(&TOPIC_METADATA_V0)),
                "",
            ),
        ],
    )
});

pub static TOPIC_PRODUCE_DATA_V0: LazyLock<Arc<Schema>> = LazyLock::new(|| {
    let partition = Schema::new(vec![
        Field::new("partition", Type::Int32, ""),
        Field::new("message_set_size", Type::Int32, ""),
    ])
    .expect("catalogue schemas have unique field names");

    schema(
        "topic_produce_data_v0",
        vec![
            Field::new("topic_name", Type::String, ""),
            Field::new("data", Type::array_of(Type::schema(partition)), ""),
        ],
    )
});

pub static PRODUCE_REQUEST_V0: LazyLock<Arc<Schema>> = LazyLock::new(|| {
    schema(
        "produce_request_v0",
        vec![
            Field::new(
                "acks",
                Type::Int16,
                "The number of nodes that should replicate the produce before returning. -1 indicates the full ISR.",
            ),
            Field::new("timeout", Type::Int32, "The time to await a response in ms."),
            Field::new("topic_data", nested(&TOPIC_PRODUCE_DATA_V0), ""),
        ],
    )
});

pub static PRODUCE_RESPONSE_V0: LazyLock<Arc<Schema>> = LazyLock::new(|| {
    let partition = Schema::new(vec![
        Field::new("partition", Type::Int32, ""),
        Field::new("error_code", Type::Int16, ""),
        Field::new("offset", Type::Int64, ""),
    ])
    .expect("catalogue schemas have unique field names");
    let topic = Schema::new(vec![
        Field::new("topic_name", Type::String, ""),
        Field::new(
            "partition_response",
            Type::array_of(Type::schema(partition)),
            "",
        ),
    ])
    .expect("catalogue schemas have unique field names");

    schema(
        "produce_response_v0",
        vec![Field::new(
            "responses",
            Type::array_of(Type::schema(topic)),
            "",
        )],
    )
});

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiKeyError {
    #[error("unknown api key {0}")]
    UnknownKey(i16),

    #[error("unknown api '{0}'")]
    UnknownName(String),
}

/// Request types, numbered as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiKey {
    Produce = 0,
    Fetch = 1,
    ListOffsets = 2,
    Metadata = 3,
}

impl ApiKey {
    pub const ALL: [ApiKey; 4] = [
        ApiKey::Produce,
        ApiKey::Fetch,
        ApiKey::ListOffsets,
        ApiKey::Metadata,
    ];

    pub fn id(self) -> i16 {
        self as i16
    }

    pub fn name(self) -> &'static str {
        match self {
            ApiKey::Produce => "produce",
            ApiKey::Fetch => "fetch",
            ApiKey::ListOffsets => "list_offsets",
            ApiKey::Metadata => "metadata",
        }
    }
}

impl TryFrom<i16> for ApiKey {
    type Error = ApiKeyError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        ApiKey::ALL
            .into_iter()
            .find(|api| api.id() == value)
            .ok_or(ApiKeyError::UnknownKey(value))
    }
}

impl FromStr for ApiKey {
    type Err = ApiKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        ApiKey::ALL
            .into_iter()
            .find(|api| api.name() == s)
            .ok_or(ApiKeyError::UnknownName(s))
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Request body schema for `api` at `version`, if one is defined.
pub fn request_schema(api: ApiKey, version: i16) -> Option<&'static Schema> {
    let schema: &'static Schema = match (api, version) {
        (ApiKey::Produce, 0) => &PRODUCE_REQUEST_V0,
        (ApiKey::Metadata, 0) => &METADATA_REQUEST_V0,
        _ => return None,
    };
    Some(schema)
}

/// Response body schema for `api` at `version`, if one is defined.
pub fn response_schema(api: ApiKey, version: i16) -> Option<&'static Schema> {
    let schema: &'static Schema = match (api, version) {
        (ApiKey::Produce, 0) => &PRODUCE_RESPONSE_V0,
        (ApiKey::Metadata, 0) => &METADATA_RESPONSE_V0,
        _ => return None,
    };
    Some(schema)
}

use std::{
    error::Error,
    io::{self, Write},
};

use clap::{Parser, Subcommand};
use log::{debug, info, warn};
use wireform::{
    ApiKey, ByteBuffer, Schema, Type,
    protocol::{
        catalogue::{REQUEST_HEADER, RESPONSE_HEADER},
        request_schema, response_schema,
    },
};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Action,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Print the request and response schemas of every api, or of one
    Doc {
        /// Only document this api (produce, fetch, list_offsets, metadata)
        api: Option<ApiKey>,
    },
    /// Decode a hex encoded message body
    Decode {
        /// Hex encoded payload
        payload: String,
        /// Message api; taken from the request header when --header is set
        #[arg(long)]
        api: Option<ApiKey>,
        /// Message version
        #[arg(long, default_value_t = 0)]
        version: i16,
        /// Decode a response instead of a request
        #[arg(long)]
        response: bool,
        /// Payload starts with a request or response header
        #[arg(long)]
        header: bool,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize env_logger; For logging to STDOUT/STDERR
    env_logger::init();

    let cli = Cli::parse();
    let mut stdout = io::stdout().lock();

    match cli.command {
        Action::Doc { api } => {
            let apis = match api {
                Some(api) => vec![api],
                None => ApiKey::ALL.to_vec(),
            };
            for api in apis {
                document(&mut stdout, api)?;
            }
        }
        Action::Decode {
            payload,
            api,
            version,
            response,
            header,
        } => {
            let mut buffer = ByteBuffer::wrap(parse_hex(&payload)?);
            let (api, version) = if header {
                let schema = if response {
                    &RESPONSE_HEADER
                } else {
                    &REQUEST_HEADER
                };
                let header = schema.read(&mut buffer)?;
                writeln!(stdout, "header: {header}")?;

                match (header.get_int16("api_key"), header.get_int16("api_version")) {
                    (Some(key), Some(version)) => (Some(ApiKey::try_from(key)?), version),
                    _ => (api, version),
                }
            } else {
                (api, version)
            };

            let api = api.ok_or("an api is required unless a request header is decoded")?;
            let schema = if response {
                response_schema(api, version)
            } else {
                request_schema(api, version)
            }
            .ok_or_else(|| format!("no schema for {api} v{version}"))?;

            info!("decoding {api} v{version} from {} bytes", buffer.remaining());
            let record = match schema.read(&mut buffer) {
                Ok(record) => record,
                Err(e) => {
                    debug!("decode failed at position {}", buffer.position());
                    return Err(e.into());
                }
            };
            if buffer.has_remaining() {
                warn!("{} trailing bytes ignored", buffer.remaining());
            }
            writeln!(stdout, "{record}")?;
        }
    }

    Ok(())
}

fn document<W: Write>(out: &mut W, api: ApiKey) -> io::Result<()> {
    writeln!(out, "{} (api key {})", api.name().to_uppercase(), api.id())?;

    for (kind, lookup) in [
        ("request", request_schema as fn(ApiKey, i16) -> Option<&'static Schema>),
        ("response", response_schema),
    ] {
        let mut version = 0;
        while let Some(schema) = lookup(api, version) {
            writeln!(out, "  {kind} v{version}")?;
            document_schema(out, schema, 2)?;
            version += 1;
        }
        if version == 0 {
            writeln!(out, "  {kind}: not defined")?;
        }
    }
    writeln!(out)
}

fn document_schema<W: Write>(out: &mut W, schema: &Schema, depth: usize) -> io::Result<()> {
    let indent = "  ".repeat(depth);
    for field in schema.fields() {
        let ty = match field.ty() {
            Type::Schema(_) => "STRUCT".to_string(),
            Type::ArrayOf(element) if matches!(**element, Type::Schema(_)) => {
                "ARRAY(STRUCT)".to_string()
            }
            ty => ty.to_string(),
        };
        if field.doc().is_empty() {
            writeln!(out, "{indent}{}: {ty}", field.name())?;
        } else {
            writeln!(out, "{indent}{}: {ty} - {}", field.name(), field.doc())?;
        }
        if let Some(nested) = field.ty().as_schema() {
            document_schema(out, nested, depth + 1)?;
        }
    }
    Ok(())
}

fn parse_hex(s: &str) -> Result<Vec<u8>, String> {
    let s: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    let s = s.strip_prefix("0x").unwrap_or(&s);
    if !s.is_ascii() {
        return Err("payload is not hex".to_string());
    }
    if s.len() % 2 != 0 {
        return Err(format!("odd number of hex digits ({})", s.len()));
    }

    (0..s.len())
        .step_by(2)
        .map(|i| {
            let digits = &s[i..i + 2];
            u8::from_str_radix(digits, 16).map_err(|_| format!("invalid hex '{digits}'"))
        })
        .collect()
}

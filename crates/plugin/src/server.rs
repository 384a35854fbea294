use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::data::ResourceData;
use crate::diag::Diagnostics;
use crate::error::PluginError;
use crate::protocol::{Operation, Request, Response, handshake};
use crate::provider::{ConfiguredProvider, Provider};

/// Capacity of the queue between request handlers and the response writer.
const RESPONSE_QUEUE: usize = 64;

/// Serve `provider` over the process stdin and stdout until the host sends
/// `stop` or closes stdin.
pub async fn serve<M>(provider: Arc<Provider<M>>) -> Result<(), PluginError>
where
    M: Send + Sync + 'static,
{
    serve_io(provider, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Serve `provider` over an arbitrary reader and writer.
///
/// Writes the handshake line, then answers one JSON request per line.
/// `schema` and `configure` are answered in order; every operation after a
/// successful `configure` runs on its own task, so responses may arrive out
/// of request order and are correlated by `id`.
pub async fn serve_io<M, R, W>(
    provider: Arc<Provider<M>>,
    reader: R,
    writer: W,
) -> Result<(), PluginError>
where
    M: Send + Sync + 'static,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(RESPONSE_QUEUE);
    let writer = tokio::spawn(write_responses(writer, rx));

    let outcome = read_requests(provider, reader, tx).await;

    // The reader side dropped its sender, so the writer drains and exits.
    let written = writer
        .await
        .map_err(|e| PluginError::Task(e.to_string()))?;
    outcome.and(written)
}

async fn read_requests<M, R>(
    provider: Arc<Provider<M>>,
    reader: R,
    tx: mpsc::Sender<Response>,
) -> Result<(), PluginError>
where
    M: Send + Sync + 'static,
    R: AsyncRead + Unpin,
{
    let mut configured: Option<ConfiguredProvider<M>> = None;
    let mut tasks: JoinSet<Result<(), PluginError>> = JoinSet::new();
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let request = match parse_request(&buf) {
            Ok(Some(request)) => request,
            Ok(None) => continue,
            Err(message) => {
                warn!(error = %message, "malformed request");
                let diags = Diagnostics::error(format!("malformed request: {message}"));
                send(&tx, Response::failed(0, diags)).await?;
                continue;
            }
        };

        let id = request.id;
        debug!(id, op = request.op.name(), "request received");

        match request.op {
            Operation::Stop => {
                info!("stop requested");
                send(&tx, Response::ok(id)).await?;
                break;
            }
            Operation::Schema => {
                send(&tx, Response::ok(id).with_schema(provider.schema())).await?;
            }
            Operation::Configure { config } => {
                let response = if configured.is_some() {
                    Response::failed(id, Diagnostics::error("provider is already configured"))
                } else {
                    match Arc::clone(&provider).configure(&config).await {
                        Ok(ready) => {
                            configured = Some(ready);
                            Response::ok(id)
                        }
                        Err(diags) => Response::failed(id, diags),
                    }
                };
                send(&tx, response).await?;
            }
            op => {
                let Some(ready) = &configured else {
                    let diags = Diagnostics::error("provider is not configured");
                    send(&tx, Response::failed(id, diags)).await?;
                    continue;
                };
                let ready = ready.clone();
                let tx = tx.clone();
                tasks.spawn(async move {
                    let response = dispatch(&ready, id, op).await;
                    send(&tx, response).await
                });
            }
        }

        while let Some(joined) = tasks.try_join_next() {
            joined.map_err(|e| PluginError::Task(e.to_string()))??;
        }
    }

    while let Some(joined) = tasks.join_next().await {
        joined.map_err(|e| PluginError::Task(e.to_string()))??;
    }
    Ok(())
}

/// Decode one request line. Blank lines yield `None`.
fn parse_request(line: &[u8]) -> Result<Option<Request>, String> {
    let line = std::str::from_utf8(line).map_err(|e| e.to_string())?;
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some).map_err(|e| e.to_string())
}

async fn send(tx: &mpsc::Sender<Response>, response: Response) -> Result<(), PluginError> {
    tx.send(response).await.map_err(|_| PluginError::Closed)
}

async fn write_responses<W>(
    mut writer: W,
    mut rx: mpsc::Receiver<Response>,
) -> Result<(), PluginError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(handshake().as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;

    while let Some(response) = rx.recv().await {
        let mut line = serde_json::to_vec(&response)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    Ok(())
}

/// Run one resource or data source operation against a configured provider.
async fn dispatch<M>(provider: &ConfiguredProvider<M>, id: u64, op: Operation) -> Response
where
    M: Send + Sync + 'static,
{
    let result = match op {
        Operation::Create { type_name, config } => provider
            .create(&type_name, &config)
            .await
            .map(|data| Response::ok(id).with_state(data.into_state())),
        Operation::Read { type_name, state } => provider
            .read(&type_name, &state)
            .await
            .map(|data| Response::ok(id).with_state(data.into_state())),
        Operation::Update {
            type_name,
            prior,
            planned,
        } => provider
            .update(&type_name, &prior, &planned)
            .await
            .map(|data| Response::ok(id).with_state(data.into_state())),
        Operation::Delete { type_name, state } => provider
            .delete(&type_name, &state)
            .await
            .map(|data| Response::ok(id).with_state(data.into_state())),
        Operation::Import {
            type_name,
            import_id,
        } => provider.import(&type_name, &import_id).await.map(|found| {
            let states = found.into_iter().map(ResourceData::into_state).collect();
            Response::ok(id).with_states(states)
        }),
        Operation::ReadDataSource { type_name, config } => provider
            .read_data_source(&type_name, &config)
            .await
            .map(|data| Response::ok(id).with_state(data.into_state())),
        Operation::Schema | Operation::Configure { .. } | Operation::Stop => Err(
            Diagnostics::error(format!("{} cannot run concurrently", op.name())),
        ),
    };

    result.unwrap_or_else(|diags| {
        debug!(id, diagnostics = %diags, "operation failed");
        Response::failed(id, diags)
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use serde_json::Value;
    use tokio::io::AsyncReadExt;

    use super::*;
    use crate::resource::Resource;
    use crate::schema::{Attribute, Schema};

    type Notes = Mutex<HashMap<String, String>>;

    struct NoteResource;

    impl Resource<Notes> for NoteResource {
        fn schema(&self) -> Schema {
            Schema::new()
                .with_attribute("name", Attribute::required_string().force_new())
                .with_attribute("text", Attribute::required_string())
        }

        async fn create(&self, meta: &Notes, data: &mut ResourceData) -> Result<(), Diagnostics> {
            let name = data.get_str("name").unwrap_or_default().to_owned();
            let text = data.get_str("text").unwrap_or_default().to_owned();
            meta.lock().unwrap().insert(name.clone(), text);
            data.set_id(name);
            Ok(())
        }

        async fn read(&self, meta: &Notes, data: &mut ResourceData) -> Result<(), Diagnostics> {
            let id = data.id().unwrap_or_default().to_owned();
            match meta.lock().unwrap().get(&id) {
                Some(text) => data.set("text", text.clone()),
                None => data.clear_id(),
            }
            Ok(())
        }

        async fn update(&self, meta: &Notes, data: &mut ResourceData) -> Result<(), Diagnostics> {
            Resource::create(self, meta, data).await
        }

        async fn delete(&self, meta: &Notes, data: &mut ResourceData) -> Result<(), Diagnostics> {
            let id = data.id().unwrap_or_default().to_owned();
            meta.lock().unwrap().remove(&id);
            data.clear_id();
            Ok(())
        }
    }

    fn provider() -> Arc<Provider<Notes>> {
        Arc::new(
            Provider::new(Schema::new(), |_config: ResourceData| async {
                Ok(Notes::default())
            })
            .with_resource("note", NoteResource),
        )
    }

    /// Feed `input` to the serve loop and return the handshake plus every
    /// response keyed by request id.
    async fn run(input: &'static str) -> (String, HashMap<u64, Value>) {
        let (client, server) = tokio::io::duplex(1 << 20);
        serve_io(provider(), input.as_bytes(), server).await.unwrap();

        let mut output = String::new();
        let mut client = client;
        client.read_to_string(&mut output).await.unwrap();

        let mut lines = output.lines();
        let handshake = lines.next().unwrap().to_owned();
        let responses = lines
            .map(|line| serde_json::from_str::<Value>(line).unwrap())
            .map(|value| (value["id"].as_u64().unwrap(), value))
            .collect();
        (handshake, responses)
    }

    #[tokio::test]
    async fn handshake_comes_first() {
        let (handshake, responses) = run("").await;
        assert_eq!(handshake, "TFREDIS_PLUGIN|1|stdio");
        assert!(responses.is_empty());
    }

    #[tokio::test]
    async fn operations_require_configure() {
        let input = concat!(
            r#"{"id": 1, "op": "schema"}"#,
            "\n",
            r#"{"id": 2, "op": "create", "type_name": "note", "config": {"name": "a", "text": "x"}}"#,
            "\n",
        );
        let (_, responses) = run(input).await;
        assert!(responses[&1]["schema"]["resources"]["note"].is_object());
        assert_eq!(
            responses[&2]["diagnostics"][0]["summary"],
            "provider is not configured"
        );
    }

    #[tokio::test]
    async fn full_lifecycle_over_the_wire() {
        let input = concat!(
            r#"{"id": 1, "op": "configure", "config": {}}"#,
            "\n",
            r#"{"id": 2, "op": "create", "type_name": "note", "config": {"name": "a", "text": "x"}}"#,
            "\n",
            r#"{"id": 3, "op": "stop"}"#,
            "\n",
            r#"{"id": 4, "op": "schema"}"#,
            "\n",
        );
        let (_, responses) = run(input).await;
        assert!(responses[&1].get("diagnostics").is_none());
        assert_eq!(responses[&2]["state"]["id"], "a");
        assert_eq!(responses[&2]["state"]["text"], "x");
        assert!(responses.contains_key(&3));
        assert!(!responses.contains_key(&4), "requests after stop are ignored");
    }

    #[tokio::test]
    async fn removed_instances_report_null_state() {
        let input = concat!(
            r#"{"id": 1, "op": "configure", "config": {}}"#,
            "\n",
            r#"{"id": 2, "op": "read", "type_name": "note", "state": {"id": "gone", "name": "gone", "text": "x"}}"#,
            "\n",
        );
        let (_, responses) = run(input).await;
        assert!(responses[&2]["state"].is_null());
        assert!(responses[&2].get("diagnostics").is_none());
    }

    #[tokio::test]
    async fn second_configure_is_rejected() {
        let input = concat!(
            r#"{"id": 1, "op": "configure", "config": {}}"#,
            "\n",
            r#"{"id": 2, "op": "configure", "config": {}}"#,
            "\n",
        );
        let (_, responses) = run(input).await;
        assert_eq!(
            responses[&2]["diagnostics"][0]["summary"],
            "provider is already configured"
        );
    }

    #[tokio::test]
    async fn malformed_lines_are_answered_and_skipped() {
        let input = concat!(
            "not json\n",
            "\n",
            r#"{"id": 7, "op": "schema"}"#,
            "\n",
        );
        let (_, responses) = run(input).await;
        let summary = responses[&0]["diagnostics"][0]["summary"].as_str().unwrap();
        assert!(summary.starts_with("malformed request"));
        assert!(responses[&7]["schema"].is_object());
    }

    #[tokio::test]
    async fn non_utf8_lines_are_answered_and_skipped() {
        let mut input = b"{\"id\": 1, \"op\": \"sch\xffema\"}\n".to_vec();
        input.extend_from_slice(b"{\"id\": 2, \"op\": \"schema\"}\n");

        let (client, server) = tokio::io::duplex(1 << 20);
        serve_io(provider(), input.as_slice(), server).await.unwrap();
        let mut output = String::new();
        let mut client = client;
        client.read_to_string(&mut output).await.unwrap();

        let responses: Vec<Value> = output
            .lines()
            .skip(1)
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], 0);
        let summary = responses[0]["diagnostics"][0]["summary"].as_str().unwrap();
        assert!(summary.starts_with("malformed request"), "{summary}");
        assert_eq!(responses[1]["id"], 2);
        assert!(responses[1]["schema"].is_object());
    }

    #[tokio::test]
    async fn import_without_support_fails() {
        let input = concat!(
            r#"{"id": 1, "op": "configure", "config": {}}"#,
            "\n",
            r#"{"id": 2, "op": "import", "type_name": "note", "import_id": "a"}"#,
            "\n",
        );
        let (_, responses) = run(input).await;
        assert_eq!(
            responses[&2]["diagnostics"][0]["summary"],
            "resource does not support import"
        );
    }
}

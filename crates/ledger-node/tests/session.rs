use ledger_core::protocol::{ChainDump, NormalReply, StatusReport, VerificationReply};
use ledger_core::{OperationService, Request, Response};
use ledger_node::{serve, NodeClient, NodeConfig};
use std::net::SocketAddr;
use std::future::Future;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

fn test_service(genesis_difficulty: u32) -> OperationService {
    NodeConfig {
        genesis_difficulty,
        benchmark: false,
        ..NodeConfig::default()
    }
    .build_service()
    .expect("service")
}

/// Run `clients` against a node serving `service`, then stop the node.
async fn with_node<F, Fut>(service: &mut OperationService, clients: F) -> anyhow::Result<()>
where
    F: FnOnce(SocketAddr) -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = serve(listener, service, async {
        let _ = stop_rx.await;
    });
    let driver = async move {
        let result = clients(addr).await;
        let _ = stop_tx.send(());
        result
    };
    let (served, driven) = tokio::join!(server, driver);
    served?;
    driven
}

async fn call(client: &mut NodeClient, request: Request) -> anyhow::Result<Response> {
    client
        .call(&request)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no reply to {request:?}"))
}

async fn status(client: &mut NodeClient) -> anyhow::Result<StatusReport> {
    match call(client, Request::Status).await? {
        Response::Status(report) => Ok(report),
        other => anyhow::bail!("expected status, got {other:?}"),
    }
}

async fn verify(client: &mut NodeClient) -> anyhow::Result<VerificationReply> {
    match call(client, Request::Verify).await? {
        Response::Verification(reply) => Ok(reply),
        other => anyhow::bail!("expected verification, got {other:?}"),
    }
}

async fn normal(client: &mut NodeClient, request: Request) -> anyhow::Result<NormalReply> {
    match call(client, request).await? {
        Response::Normal(reply) => Ok(reply),
        other => anyhow::bail!("expected a normal reply, got {other:?}"),
    }
}

#[tokio::test]
async fn corrupt_and_repair_over_tcp() -> anyhow::Result<()> {
    let mut service = test_service(2);
    with_node(&mut service, |addr| async move {
        let mut client = NodeClient::connect(addr).await?;

        let added = normal(
            &mut client,
            Request::Add {
                difficulty: 1,
                data: "tx1".into(),
            },
        )
        .await?;
        assert_eq!(added.choice, 1);
        assert!(added.response.starts_with("Total execution time to add this block was"));

        let before = status(&mut client).await?;
        assert_eq!(before.chain_size, 2);
        assert_eq!(before.total_difficulty, 3);
        assert_eq!(before.hashes_per_second, None);
        assert_eq!(verify(&mut client).await?.verification_op, "TRUE");

        let corrupted = normal(
            &mut client,
            Request::Corrupt {
                block_id: 0,
                data: "hacked".into(),
            },
        )
        .await?;
        assert_eq!(corrupted.response, "Block 0 now holds hacked");

        let broken = verify(&mut client).await?;
        assert_ne!(broken.verification_op, "TRUE");
        assert!(broken.verification_op.contains('0'));

        let repaired = normal(&mut client, Request::Repair).await?;
        assert_eq!(repaired.choice, 5);
        assert_eq!(verify(&mut client).await?.verification_op, "TRUE");
        assert_ne!(status(&mut client).await?.chain_hash, before.chain_hash);

        client.close().await?;
        Ok(())
    })
    .await?;

    assert_eq!(service.ledger().len(), 2);
    assert_eq!(service.ledger().get(0)?.data(), "hacked");
    assert!(service.ledger().validate().is_valid());
    Ok(())
}

#[tokio::test]
async fn chain_dump_over_tcp() -> anyhow::Result<()> {
    let mut service = test_service(1);
    with_node(&mut service, |addr| async move {
        let mut client = NodeClient::connect(addr).await?;
        for data in ["a", "b"] {
            normal(
                &mut client,
                Request::Add {
                    difficulty: 1,
                    data: data.into(),
                },
            )
            .await?;
        }
        let Response::ChainDump(ChainDump {
            choice,
            chain_hash,
            blocks,
        }) = call(&mut client, Request::View).await?
        else {
            anyhow::bail!("expected a chain dump");
        };
        assert_eq!(choice, 3);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].previous_hash(), "");
        assert_eq!(blocks[1].previous_hash(), blocks[0].hash());
        assert_eq!(blocks[2].previous_hash(), blocks[1].hash());
        assert_eq!(chain_hash, blocks[2].hash());
        client.close().await?;
        Ok(())
    })
    .await
}

#[tokio::test]
async fn ledger_survives_across_sessions() -> anyhow::Result<()> {
    let mut service = test_service(0);
    with_node(&mut service, |addr| async move {
        let mut first = NodeClient::connect(addr).await?;
        normal(
            &mut first,
            Request::Add {
                difficulty: 0,
                data: "kept".into(),
            },
        )
        .await?;
        first.close().await?;

        // A caller that hangs up without the exit operation.
        let mut second = NodeClient::connect(addr).await?;
        normal(
            &mut second,
            Request::Add {
                difficulty: 0,
                data: "also kept".into(),
            },
        )
        .await?;
        drop(second);

        let mut third = NodeClient::connect(addr).await?;
        assert_eq!(status(&mut third).await?.chain_size, 3);
        third.close().await?;
        Ok(())
    })
    .await?;
    assert_eq!(service.ledger().latest()?.data(), "also kept");
    Ok(())
}

#[tokio::test]
async fn malformed_lines_keep_the_session_open() -> anyhow::Result<()> {
    let mut service = test_service(0);
    with_node(&mut service, |addr| async move {
        let stream = TcpStream::connect(addr).await?;
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);
        let mut line = String::new();

        writer.write_all(b"this is not json\n").await?;
        reader.read_line(&mut line).await?;
        let reply: serde_json::Value = serde_json::from_str(&line)?;
        assert_eq!(reply["choice"], -1);
        assert!(reply["response"].as_str().unwrap_or_default().contains("malformed"));

        line.clear();
        writer.write_all(b"{\"operation\":42}\n").await?;
        reader.read_line(&mut line).await?;
        let reply: serde_json::Value = serde_json::from_str(&line)?;
        assert_eq!(reply["choice"], 42);
        assert!(reply["response"]
            .as_str()
            .unwrap_or_default()
            .contains("unsupported operation 42"));

        line.clear();
        writer.write_all(b"{\"operation\":4,\"blockID\":7,\"data\":\"x\"}\n").await?;
        reader.read_line(&mut line).await?;
        let reply: serde_json::Value = serde_json::from_str(&line)?;
        assert_eq!(reply["choice"], 4);
        assert!(reply["response"].as_str().unwrap_or_default().contains("out of range"));

        line.clear();
        writer.write_all(b"{\"operation\":0}\n").await?;
        reader.read_line(&mut line).await?;
        let reply: serde_json::Value = serde_json::from_str(&line)?;
        assert_eq!(reply["chainSize"], 1);

        writer.write_all(b"{\"operation\":6}\n").await?;
        line.clear();
        assert_eq!(reader.read_line(&mut line).await?, 0);
        Ok(())
    })
    .await
}

use std::time::Duration;

use tokio::sync::{broadcast, oneshot};
use trackloop_core::{parse_coordinates, ErrorSample, Frame, PixelCoord, StreamConfig};
use trackloop_link::{memory_pair, LinkEvent, PeerLink};
use trackloop_session::{ClientSession, ServerSession};
use trackloop_simulator::draw_ball;

const TEST_TIMEOUT: Duration = Duration::from_secs(10);

async fn next_sample(rx: &mut broadcast::Receiver<ErrorSample>) -> ErrorSample {
    loop {
        match tokio::time::timeout(TEST_TIMEOUT, rx.recv())
            .await
            .expect("timed out waiting for an error sample")
        {
            Ok(sample) => return sample,
            // A slow test runner may lag the broadcast; skip and keep going
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => panic!("error channel closed"),
        }
    }
}

/// Full loop over an in-memory link: generated frames reach the client, the
/// detection pipeline estimates positions, and the server's estimator
/// produces samples. The ball's x never moves, so the x estimate is exact;
/// the y error is bounded by the round-trip lag in ticks.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn closed_loop_over_memory_link() {
    let config = StreamConfig::default();
    let (server_io, client_io) = memory_pair();

    let (handles_tx, handles_rx) = oneshot::channel();
    let server_config = config.clone();
    let server_task = tokio::spawn(async move {
        let link = PeerLink::offer(server_io, &server_config).await?;
        let session = ServerSession::new(server_config, link);
        handles_tx
            .send((session.handle(), session.subscribe_errors()))
            .ok();
        session.run().await
    });

    let (client_handle_tx, client_handle_rx) = oneshot::channel();
    let client_task = tokio::spawn(async move {
        let (link, params) = PeerLink::answer(client_io).await?;
        let session = ClientSession::new(link, params);
        client_handle_tx.send(session.handle()).ok();
        session.run().await
    });

    let (server_handle, mut error_rx) = handles_rx.await.expect("server never started");
    let client_handle = client_handle_rx.await.expect("client never started");

    let mut samples = Vec::new();
    while samples.len() < 5 {
        samples.push(next_sample(&mut error_rx).await);
    }

    for sample in &samples {
        assert_eq!(sample.estimated.x, 320, "x is constant by design");
        assert!(
            sample.distance <= 100.0,
            "round-trip lag too large: {sample:?}"
        );
    }

    server_handle.stop();
    client_handle.stop();
    tokio::time::timeout(TEST_TIMEOUT, server_task)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();
    tokio::time::timeout(TEST_TIMEOUT, client_task)
        .await
        .expect("client did not stop")
        .unwrap()
        .unwrap();
}

/// A frame buffer with the wrong size is discarded on the client without
/// corrupting the queue: the next valid frame still produces an estimate.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn bad_frame_is_discarded_without_breaking_the_pipeline() {
    let config = StreamConfig::default();
    let (server_io, client_io) = memory_pair();

    let (server, client) = tokio::join!(
        PeerLink::offer(server_io, &config),
        PeerLink::answer(client_io)
    );
    let mut server = server.unwrap();
    let (client_link, params) = client.unwrap();

    let session = ClientSession::new(client_link, params);
    let client_handle = session.handle();
    let client_task = tokio::spawn(session.run());

    server.sender.begin_streaming().unwrap();
    // Undersized payload: a frame rendered at the wrong dimensions
    server
        .sender
        .send_frame(&Frame::black(320, 240))
        .await
        .unwrap();
    // A valid frame with the ball at a known position
    server
        .sender
        .send_frame(&draw_ball(&config, 320, 100))
        .await
        .unwrap();

    let event = tokio::time::timeout(TEST_TIMEOUT, server.receiver.recv())
        .await
        .expect("timed out waiting for the estimate")
        .unwrap();
    match event {
        LinkEvent::Control(msg) => {
            assert_eq!(parse_coordinates(&msg).unwrap(), PixelCoord::new(320, 100));
        }
        other => panic!("expected a coordinate message, got {other:?}"),
    }

    client_handle.stop();
    tokio::time::timeout(TEST_TIMEOUT, client_task)
        .await
        .expect("client did not stop")
        .unwrap()
        .unwrap();
}

/// Stopping the server tears the whole loop down: the client observes the
/// goodbye and exits cleanly on its own.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn server_stop_closes_the_client() {
    let config = StreamConfig::default();
    let (server_io, client_io) = memory_pair();

    let (handle_tx, handle_rx) = oneshot::channel();
    let server_config = config.clone();
    let server_task = tokio::spawn(async move {
        let link = PeerLink::offer(server_io, &server_config).await?;
        let session = ServerSession::new(server_config, link);
        handle_tx.send(session.handle()).ok();
        session.run().await
    });

    let client_task = tokio::spawn(async move {
        let (link, params) = PeerLink::answer(client_io).await?;
        ClientSession::new(link, params).run().await
    });

    let server_handle = handle_rx.await.expect("server never started");
    // Let at least one frame through before stopping
    tokio::time::sleep(config.frame_period()).await;
    server_handle.stop();

    tokio::time::timeout(TEST_TIMEOUT, server_task)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();
    tokio::time::timeout(TEST_TIMEOUT, client_task)
        .await
        .expect("client did not stop")
        .unwrap()
        .unwrap();
}

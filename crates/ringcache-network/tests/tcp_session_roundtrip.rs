//! Drives `Worker`/`WorkerHandle` over real loopback sockets end to end:
//! a std blocking client talks the memcached binary protocol to a worker
//! thread running its own `mio::Poll` loop, the same shape
//! `ringcache-server`'s accept thread and worker threads use in
//! production.

use std::io::{Read, Write};
use std::net::TcpStream as StdTcpStream;
use std::sync::Arc;
use std::sync::mpsc::channel;
use std::thread;
use std::time::Duration;

use bytes::{BufMut, BytesMut};
use mio::{Events, Interest, Poll, Token};
use ringcache_network::tcp::{Worker, bind_listener};
use ringcache_table::Table;

const ACCEPT_TOKEN: Token = Token(0);

fn request_bytes(opcode: u8, key: &[u8], value: &[u8]) -> Vec<u8> {
    let mut v = BytesMut::new();
    v.put_u8(0x80);
    v.put_u8(opcode);
    v.put_u16(key.len() as u16);
    v.put_u8(0);
    v.put_u8(0);
    v.put_u16(0);
    v.put_u32((key.len() + value.len()) as u32);
    v.put_u32(0);
    v.put_u64(0);
    v.extend_from_slice(key);
    v.extend_from_slice(value);
    v.to_vec()
}

fn read_response(stream: &mut StdTcpStream) -> Vec<u8> {
    let mut header = [0u8; 24];
    stream.read_exact(&mut header).expect("read header");
    let bodylen = u32::from_be_bytes([header[8], header[9], header[10], header[11]]) as usize;
    let mut body = vec![0u8; bodylen];
    if bodylen > 0 {
        stream.read_exact(&mut body).expect("read body");
    }
    let mut full = header.to_vec();
    full.extend_from_slice(&body);
    full
}

/// Spawns one worker thread plus an accept loop on the calling thread's
/// helper thread, mirroring `ringcache-server`'s accept/worker split.
/// Returns the bound local address; the server keeps running until the
/// process exits (acceptable for a short-lived test).
fn spawn_server() -> std::net::SocketAddr {
    let table = Arc::new(Table::new(64).unwrap());
    let (mut worker, handle) = Worker::new(Arc::clone(&table)).unwrap();

    let (addr_tx, addr_rx) = channel();

    thread::spawn(move || {
        let accept_poll = Poll::new().unwrap();
        let addr = "127.0.0.1:0".parse().unwrap();
        let listener = bind_listener(&accept_poll, addr, ACCEPT_TOKEN).unwrap();
        addr_tx.send(listener.local_addr().unwrap()).unwrap();

        let mut events = Events::with_capacity(16);
        loop {
            accept_poll.poll(&mut events, Some(Duration::from_millis(200))).unwrap();
            for event in events.iter() {
                if event.token() == ACCEPT_TOKEN {
                    while let Ok((stream, peer_addr)) = listener.accept() {
                        handle.dispatch(stream, peer_addr).unwrap();
                    }
                }
            }
        }
    });

    thread::spawn(move || {
        loop {
            worker.run_once(Some(Duration::from_millis(200))).unwrap();
        }
    });

    addr_rx.recv_timeout(Duration::from_secs(5)).expect("accept thread bound a listener")
}

#[test]
fn set_then_get_round_trips_over_a_real_socket() {
    let addr = spawn_server();
    let mut client = StdTcpStream::connect(addr).expect("connect");
    client.set_nodelay(true).unwrap();

    client.write_all(&request_bytes(0x01, b"foo", b"hello world")).unwrap();
    let set_reply = read_response(&mut client);
    assert_eq!(set_reply[0], 0x81);
    assert_eq!(u16::from_be_bytes([set_reply[6], set_reply[7]]), 0x0000);

    client.write_all(&request_bytes(0x00, b"foo", b"")).unwrap();
    let get_reply = read_response(&mut client);
    assert_eq!(get_reply[0], 0x81);
    assert_eq!(&get_reply[24..], b"\x00\x00\x00\x00hello world");
}

#[test]
fn pipelined_requests_in_one_write_both_get_replies() {
    let addr = spawn_server();
    let mut client = StdTcpStream::connect(addr).expect("connect");
    client.set_nodelay(true).unwrap();

    let mut combined = request_bytes(0x01, b"k", b"v");
    combined.extend_from_slice(&request_bytes(0x00, b"k", b""));
    client.write_all(&combined).unwrap();

    let set_reply = read_response(&mut client);
    assert_eq!(u16::from_be_bytes([set_reply[6], set_reply[7]]), 0x0000);
    let get_reply = read_response(&mut client);
    assert_eq!(&get_reply[24..], b"\x00\x00\x00\x00v");
}

#[test]
fn quit_closes_the_connection_after_its_reply() {
    let addr = spawn_server();
    let mut client = StdTcpStream::connect(addr).expect("connect");
    client.set_nodelay(true).unwrap();

    client.write_all(&request_bytes(0x07, b"", b"")).unwrap();
    let reply = read_response(&mut client);
    assert_eq!(reply[1], 0x07);

    let mut buf = [0u8; 8];
    let n = client.read(&mut buf).expect("socket still readable until EOF");
    assert_eq!(n, 0, "server should have shut down the stream after QUIT");
}

#[test]
fn multiple_concurrent_clients_each_get_independent_replies() {
    let addr = spawn_server();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            thread::spawn(move || {
                let key = format!("key{i}");
                let value = format!("value{i}");
                let mut client = StdTcpStream::connect(addr).expect("connect");
                client.set_nodelay(true).unwrap();
                client.write_all(&request_bytes(0x01, key.as_bytes(), value.as_bytes())).unwrap();
                let _ = read_response(&mut client);
                client.write_all(&request_bytes(0x00, key.as_bytes(), b"")).unwrap();
                let reply = read_response(&mut client);
                assert_eq!(&reply[24 + 4..], value.as_bytes());
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}

mod common;

use std::io::{self, Read, Write};
use std::sync::Arc;

use rand::Rng;
use teleport::transport::Duplex;
use teleport::utils::xor::{Keystream, XorReader, XorStream, XorWriter};

fn key(bytes: &[u8]) -> Arc<[u8]> {
    Arc::from(bytes.to_vec())
}

/// Accepts at most `limit` bytes per write call.
struct ShortWriter {
    limit: usize,
    data: Vec<u8>,
}

impl Write for ShortWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = buf.len().min(self.limit);
        self.data.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn keystream_repeats_key() {
    let mut stream = Keystream::new(key(b"ab"));
    let mut buf = [0u8; 5];
    stream.apply(&mut buf);
    assert_eq!(buf, [0x61, 0x62, 0x61, 0x62, 0x61]);
    assert_eq!(stream.position(), 5);

    // continues where it stopped
    let mut buf = [0u8; 1];
    stream.apply(&mut buf);
    assert_eq!(buf, [0x62]);
}

#[test]
fn encrypt_then_decrypt() {
    let mut rng = rand::thread_rng();
    let secret = key(b"firewall");
    let input: Vec<u8> = (0..20000).map(|_| rng.gen()).collect();

    let mut writer = XorWriter::new(Vec::new(), secret.clone());
    for chunk in input.chunks(777) {
        writer.write_all(chunk).unwrap();
    }
    assert_eq!(writer.position(), input.len() as u64);
    let ciphertext = writer.into_inner();
    assert_ne!(ciphertext, input);

    let mut reader = XorReader::new(&ciphertext[..], secret);
    let mut plaintext = Vec::new();
    reader.read_to_end(&mut plaintext).unwrap();
    assert_eq!(reader.position(), input.len() as u64);
    assert_eq!(plaintext, input);
}

#[test]
fn empty_key_is_identity() {
    let input = b"hello world";

    let mut writer = XorWriter::new(Vec::new(), key(b""));
    writer.write_all(input).unwrap();
    assert_eq!(writer.position(), 0);
    assert_eq!(writer.into_inner(), input);

    let mut reader = XorReader::new(&input[..], key(b""));
    let mut out = Vec::new();
    reader.read_to_end(&mut out).unwrap();
    assert_eq!(out, input);
}

#[test]
fn write_keeps_caller_buffer() {
    let input = b"plain".to_vec();
    let mut writer = XorWriter::new(Vec::new(), key(b"k"));
    writer.write_all(&input).unwrap();
    assert_eq!(input, b"plain");
    println!("ciphertext:{}", hex::encode(writer.into_inner()));
}

#[test]
fn short_writes_stay_in_step() {
    let secret = key(b"0123456789");
    let input = b"the quick brown fox jumps over the lazy dog";

    let mut writer = XorWriter::new(ShortWriter { limit: 3, data: Vec::new() }, secret.clone());
    writer.write_all(input).unwrap();
    assert_eq!(writer.position(), input.len() as u64);

    let ciphertext = writer.into_inner().data;
    let mut reader = XorReader::new(&ciphertext[..], secret);
    let mut plaintext = Vec::new();
    reader.read_to_end(&mut plaintext).unwrap();
    assert_eq!(plaintext, input);
}

#[test]
fn directions_have_own_positions() {
    let (client, server) = common::tcp_pair();
    let secret = key(b"xyz");

    let mut peer = XorStream::new(client, secret.clone());
    let mut stream = XorStream::new(server, secret);

    peer.write_all(b"ping!").unwrap();
    let mut buf = [0u8; 5];
    stream.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, b"ping!");
    assert_eq!(stream.positions(), (5, 0));

    stream.write_all(b"ok").unwrap();
    assert_eq!(stream.positions(), (5, 2));
    let mut buf = [0u8; 2];
    peer.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, b"ok");
}

#[test]
fn split_carries_positions_over() {
    let (client, server) = common::tcp_pair();
    let secret = key(b"teleport");

    let mut peer = XorStream::new(client, secret.clone());
    let mut stream = XorStream::new(server, secret);

    // handshake-like exchange on the whole stream first
    peer.write_all(&[5, 1, 0]).unwrap();
    let mut greeting = [0u8; 3];
    stream.read_exact(&mut greeting).unwrap();
    assert_eq!(greeting, [5, 1, 0]);
    stream.write_all(&[5, 0]).unwrap();
    let mut reply = [0u8; 2];
    peer.read_exact(&mut reply).unwrap();
    assert_eq!(reply, [5, 0]);

    let (mut reader, mut writer) = stream.split().unwrap();
    assert_eq!(reader.position(), 3);
    assert_eq!(writer.position(), 2);

    peer.write_all(b"after split").unwrap();
    let mut buf = [0u8; 11];
    reader.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, b"after split");

    writer.write_all(b"back").unwrap();
    let mut buf = [0u8; 4];
    peer.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, b"back");
}

use std::io::Cursor;

use proptest::prelude::*;
use tinyweb::buffer::ByteBuffer;

fn assert_invariant(buf: &ByteBuffer) {
    assert_eq!(
        buf.readable_bytes() + buf.prependable_bytes() + buf.writable_bytes(),
        buf.capacity()
    );
}

#[test]
fn test_new_buffer_is_empty() {
    let buf = ByteBuffer::new(64);

    assert_eq!(buf.capacity(), 64);
    assert_eq!(buf.readable_bytes(), 0);
    assert_eq!(buf.writable_bytes(), 64);
    assert_eq!(buf.prependable_bytes(), 0);
    assert!(buf.peek().is_empty());
}

#[test]
fn test_append_then_retrieve_returns_same_bytes() {
    let mut buf = ByteBuffer::new(16);
    buf.append(b"hello ");
    buf.append_str("world");

    assert_eq!(buf.peek(), b"hello world");
    buf.retrieve(6);
    assert_eq!(buf.peek(), b"world");
    assert_eq!(buf.prependable_bytes(), 6);
    assert_eq!(buf.retrieve_all_as_string(), "world");
    assert_eq!(buf.readable_bytes(), 0);
    assert_eq!(buf.prependable_bytes(), 0);
}

#[test]
fn test_retrieve_until_offset() {
    let mut buf = ByteBuffer::default();
    buf.append(b"line\r\nrest");

    let end = buf.peek().iter().position(|&b| b == b'\r').unwrap();
    buf.retrieve_until(end + 2);

    assert_eq!(buf.peek(), b"rest");
}

#[test]
#[should_panic]
fn test_retrieve_past_readable_panics() {
    let mut buf = ByteBuffer::new(8);
    buf.append(b"abc");
    buf.retrieve(4);
}

#[test]
fn test_growth_preserves_unread_bytes() {
    let mut buf = ByteBuffer::new(8);
    buf.append(b"abcdef");
    buf.retrieve(2);

    let before = buf.capacity();
    buf.append(b"0123456789");

    assert!(buf.capacity() > before);
    assert_eq!(buf.peek(), b"cdef0123456789");
    assert_invariant(&buf);
}

#[test]
fn test_compaction_does_not_grow() {
    let mut buf = ByteBuffer::new(10);
    buf.append(b"abcdefgh");
    buf.retrieve(6);

    buf.append(b"1234");

    assert_eq!(buf.capacity(), 10);
    assert_eq!(buf.prependable_bytes(), 0);
    assert_eq!(buf.peek(), b"gh1234");
}

#[test]
fn test_fill_writable_region_directly() {
    let mut buf = ByteBuffer::new(8);
    buf.ensure_writable(4);
    buf.begin_write()[..4].copy_from_slice(b"abcd");
    buf.has_written(4);

    assert_eq!(buf.peek(), b"abcd");
    assert_eq!(buf.writable_bytes(), 4);
}

#[test]
fn test_append_buffer_does_not_consume_source() {
    let mut src = ByteBuffer::default();
    src.append(b"payload");
    let mut dst = ByteBuffer::default();

    dst.append_buffer(&src);

    assert_eq!(dst.peek(), b"payload");
    assert_eq!(src.peek(), b"payload");
}

#[test]
fn test_read_from_spills_into_overflow() {
    let data: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
    let mut reader = Cursor::new(data.clone());
    let mut buf = ByteBuffer::new(128);

    let mut total = 0;
    loop {
        let n = buf.read_from(&mut reader).unwrap();
        if n == 0 {
            break;
        }
        total += n;
    }

    assert_eq!(total, data.len());
    assert_eq!(buf.peek(), &data[..]);
    assert_invariant(&buf);
}

#[test]
fn test_read_error_leaves_cursors() {
    let mut buf = ByteBuffer::new(16);
    buf.append(b"keep");

    let err = buf
        .read_with(|_| Err(std::io::ErrorKind::WouldBlock.into()))
        .unwrap_err();

    assert_eq!(err.kind(), std::io::ErrorKind::WouldBlock);
    assert_eq!(buf.peek(), b"keep");
}

#[test]
fn test_partial_write_advances_by_accepted_amount() {
    let mut buf = ByteBuffer::default();
    buf.append(b"0123456789");

    let n = buf.write_with(|bytes| Ok(bytes.len().min(4))).unwrap();
    assert_eq!(n, 4);
    assert_eq!(buf.peek(), b"456789");

    let mut out = Vec::new();
    buf.write_to(&mut out).unwrap();
    assert_eq!(out, b"456789");
    assert_eq!(buf.readable_bytes(), 0);
}

#[test]
fn test_write_error_leaves_cursors() {
    let mut buf = ByteBuffer::default();
    buf.append(b"data");

    let result = buf.write_with(|_| Err(std::io::ErrorKind::BrokenPipe.into()));

    assert!(result.is_err());
    assert_eq!(buf.peek(), b"data");
}

#[derive(Debug, Clone)]
enum Op {
    Append(Vec<u8>),
    Retrieve(usize),
    RetrieveAll,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        proptest::collection::vec(any::<u8>(), 0..200).prop_map(Op::Append),
        (0usize..300).prop_map(Op::Retrieve),
        Just(Op::RetrieveAll),
    ]
}

proptest! {
    #[test]
    fn cursor_invariant_holds(ops in proptest::collection::vec(op(), 0..64)) {
        let mut buf = ByteBuffer::new(32);
        let mut model: Vec<u8> = Vec::new();

        for op in ops {
            match op {
                Op::Append(bytes) => {
                    buf.append(&bytes);
                    model.extend_from_slice(&bytes);
                }
                Op::Retrieve(n) => {
                    let n = n.min(buf.readable_bytes());
                    buf.retrieve(n);
                    model.drain(..n);
                }
                Op::RetrieveAll => {
                    buf.retrieve_all();
                    model.clear();
                }
            }
            prop_assert_eq!(
                buf.readable_bytes() + buf.prependable_bytes() + buf.writable_bytes(),
                buf.capacity()
            );
            prop_assert_eq!(buf.peek(), &model[..]);
        }
    }
}

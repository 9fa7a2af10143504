use std::fmt::{self, Display, Formatter};
use std::io::{self, ErrorKind, Read, Write};
use std::sync::mpsc::{self, SyncSender};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, error};

use crate::transport::{Deadline, Duplex};

pub const BUFFER_SIZE: usize = 8192;
pub const READ_IDLE_TIMEOUT: Duration = Duration::from_secs(300);
pub const WRITE_IDLE_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// frontend -> backend
    Upstream,
    /// backend -> frontend
    Downstream,
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Upstream => write!(f, "frontend->backend"),
            Direction::Downstream => write!(f, "backend->frontend"),
        }
    }
}

// Posts the shutdown notice when the copy loop is left, whichever way.
struct Notice {
    dir: Direction,
    shutdown: SyncSender<Direction>,
}

impl Drop for Notice {
    fn drop(&mut self) {
        // the channel has a slot per direction; nobody waiting is fine too
        let _ = self.shutdown.try_send(self.dir);
    }
}

// A socket shut down by this process reads as EOF, or NotConnected on
// some platforms. Neither is worth a log line.
fn is_closed_conn(err: &io::Error) -> bool {
    matches!(err.kind(), ErrorKind::NotConnected | ErrorKind::UnexpectedEof)
}

/// Copies `src` into `dst` until EOF or the first error, re-arming the idle
/// deadlines before every read and write. Exactly one notice for `dir` is
/// sent on `shutdown` when it returns. Returns the number of bytes copied.
pub fn iobridge<R, W>(src: &mut R, dst: &mut W, dir: Direction, tag: &str, shutdown: SyncSender<Direction>) -> u64
where
    R: Read + Deadline,
    W: Write + Deadline,
{
    let _notice = Notice { dir, shutdown };
    let mut buf = vec![0u8; BUFFER_SIZE];
    let mut copied: u64 = 0;

    loop {
        if let Err(err) = src.set_read_deadline(Some(Instant::now() + READ_IDLE_TIMEOUT)) {
            error!("{} error set read deadline {}: {}", tag, dir, err);
            break;
        }

        let n = match src.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(ref err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                if !is_closed_conn(&err) {
                    error!("{} error reading {}: {}", tag, dir, err);
                }
                break;
            }
        };

        if let Err(err) = dst.set_write_deadline(Some(Instant::now() + WRITE_IDLE_TIMEOUT)) {
            error!("{} error set write deadline {}: {}", tag, dir, err);
            break;
        }

        if let Err(err) = dst.write_all(&buf[..n]) {
            error!("{} error writing {}: {}", tag, dir, err);
            break;
        }
        copied += n as u64;
    }

    debug!("{} {} done, {} bytes", tag, dir, copied);
    copied
}

/// Runs both directions between `front` and `back` on their own threads
/// and returns as soon as the first one ends. Closing the sockets is left
/// to the caller; that is what stops the other direction.
pub fn pipe<F: Duplex, B: Duplex>(front: F, back: B, tag: &str) -> io::Result<Direction> {
    let (mut front_reader, mut front_writer) = front.split()?;
    let (mut back_reader, mut back_writer) = back.split()?;

    let (shutdown, notices) = mpsc::sync_channel(2);

    let (up_tag, up_shutdown) = (tag.to_owned(), shutdown.clone());
    thread::Builder::new()
        .name(format!("{} up", tag))
        .spawn(move || iobridge(&mut front_reader, &mut back_writer, Direction::Upstream, &up_tag, up_shutdown))?;

    let down_tag = tag.to_owned();
    thread::Builder::new()
        .name(format!("{} down", tag))
        .spawn(move || iobridge(&mut back_reader, &mut front_writer, Direction::Downstream, &down_tag, shutdown))?;

    // wait for either side to close
    notices
        .recv()
        .map_err(|_| io::Error::new(ErrorKind::BrokenPipe, "bridge stopped without notice"))
}

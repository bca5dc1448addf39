mod stream;
mod worker;

pub use stream::{ConnState, TcpStream};
pub use worker::{Worker, WorkerHandle, bind_listener};

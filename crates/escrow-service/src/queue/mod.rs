pub mod redis_queue;

pub use redis_queue::RedisQueue;

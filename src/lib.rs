/*!
# Overview
s3mirror mirrors one S3 bucket into another bucket that may live in a different account.

A run has three phases, each starting only after the previous one succeeded:

- Bucket configuration: the target bucket is created if needed, then the source bucket's
  policy, versioning status and lifecycle rules are copied to it.
- Listing: the whole source bucket is listed, page by page, into one snapshot.
- Objects: every listed object whose size or ETag differs from the target (or that is missing
  there) is copied with a server-side copy, keeping its metadata, tags and storage class.
  Each copy is verified by reading the target object back.

Objects are processed concurrently up to a configured limit. The first failure stops new
objects from being started, waits for the ones in flight, and is returned together with the
counters of what was done.

## As a library
The CLI is a thin wrapper around [`pipeline::Pipeline`].

```no_run
use s3mirror::config::Config;
use s3mirror::config::args::parse_from_args;
use s3mirror::pipeline::Pipeline;
use s3mirror::types::token::create_pipeline_cancellation_token;

#[tokio::main]
async fn main() {
    let args = vec!["s3mirror", "--config", "./.config.json", "--concurrency", "16"];
    let config = Config::try_from(parse_from_args(args).unwrap()).unwrap();

    let cancellation_token = create_pipeline_cancellation_token();
    let mut pipeline = Pipeline::new(config, cancellation_token).await;

    // progress events. dropping the receiver is fine if they are not needed.
    let stats_receiver = pipeline.get_stats_receiver();
    tokio::spawn(async move {
        while let Ok(stats) = stats_receiver.recv().await {
            println!("{stats:?}");
        }
    });

    match pipeline.run().await {
        Ok(report) => println!("{report:?}"),
        Err(failure) => eprintln!("{failure}"),
    }
}
```
*/

pub use config::Config;

pub mod config;
pub mod pipeline;
pub mod storage;
pub mod types;

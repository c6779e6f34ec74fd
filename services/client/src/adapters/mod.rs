pub mod api;
pub mod downloads;
pub mod google;
pub mod storage;
pub mod ws;

pub use api::HttpApiAdapter;
pub use downloads::FsDownloadSink;
pub use google::GoogleSignIn;
pub use storage::FileTokenStorage;
pub use ws::TungsteniteConnector;

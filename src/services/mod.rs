pub mod script_watcher;
pub mod video_exporter;

pub use script_watcher::ScriptWatcher;
pub use video_exporter::VideoExporter;

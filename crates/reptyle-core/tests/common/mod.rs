pub mod video_server;

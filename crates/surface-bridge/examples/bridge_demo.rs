//! Drives the bridge the way a host plugin would: create a surface,
//! push a couple of frames by raw pointer, inspect the result, dispose.

use std::sync::Arc;

use serde_json::json;
use surface_bridge::{FrameBridge, MemoryHost, PixelFormat, SurfaceId};

fn main() {
    let host = Arc::new(MemoryHost::new());
    let bridge = FrameBridge::new(host.clone());

    let id = bridge
        .handle("create", &json!({ "format": "nv12", "width": 64, "height": 48 }))
        .expect("create");
    println!("created nv12 surface with id {id}");

    let len = PixelFormat::Nv12.min_frame_len(64, 48);
    for shade in [0x10u8, 0x80u8] {
        let frame = vec![shade; len];
        let args = json!({
            "textureId": id,
            "ptr": frame.as_ptr() as u64,
            "size": frame.len(),
        });
        bridge.handle("pushFrame", &args).expect("pushFrame");
        println!("pushed {len}-byte frame of 0x{shade:02x}");
    }
    println!("frames presented: {}", host.ready_count(SurfaceId(id)));

    let surface = bridge.registry().lookup(id).expect("lookup");
    surface
        .with_planes(|buffer| {
            println!(
                "luma plane stride {} (tight row is 64), first byte 0x{:02x}",
                buffer.plane_stride(0),
                buffer.plane(0)[0]
            );
        })
        .expect("readback");

    bridge.handle("dispose", &json!({ "textureId": id })).expect("dispose");
    println!("disposed surface {id}");
}

//! darkmatter demo: rotating cubes through the software pipeline
//!
//! Usage: `darkmatter [config.ron] [texture.png]`
//!
//! - Tab: toggle cull face
//! - P: save a PNG snapshot

use std::path::PathBuf;
use macroquad::prelude::*;
use darkmatter::config::load_config;
use darkmatter::logging::{init_logging, LoggingConfig};
use darkmatter::rasterizer::{
    create_test_cube, Color, CullFace, Mat4, Material, RenderConfig, RenderContext, Texture, Vec3,
    HEIGHT, WIDTH,
};

fn window_conf() -> Conf {
    Conf {
        window_title: format!("darkmatter v{}", env!("CARGO_PKG_VERSION")),
        window_width: WIDTH as i32 * 3,
        window_height: HEIGHT as i32 * 3,
        window_resizable: true,
        ..Default::default()
    }
}

fn load_render_config(path: Option<&String>) -> RenderConfig {
    let Some(path) = path else {
        return RenderConfig::default();
    };
    match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load {}: {}, using defaults", path, e);
            RenderConfig::default()
        }
    }
}

fn load_texture(path: Option<&String>) -> Texture {
    let fallback = || Texture::checkerboard(16, 16, Color::new(200, 90, 40), Color::new(40, 40, 70));
    let Some(path) = path else {
        return fallback();
    };
    let loaded = std::fs::read(path)
        .map_err(|e| e.to_string())
        .and_then(|bytes| Texture::from_bytes(&bytes, path.clone()));
    match loaded {
        Ok(texture) => {
            log::info!("Loaded texture {} ({}x{})", path, texture.width, texture.height);
            texture
        }
        Err(e) => {
            log::warn!("Failed to load texture {}: {}", path, e);
            fallback()
        }
    }
}

/// Ground plane reaching behind the camera, so it is always near clipped
fn draw_ground(ctx: &mut RenderContext) {
    let y = -2.0;
    let corners = [
        Vec3::new(-12.0, y, 4.0),
        Vec3::new(12.0, y, 4.0),
        Vec3::new(12.0, y, -40.0),
        Vec3::new(-12.0, y, -40.0),
    ];
    let [a, b, c, d] = corners;
    ctx.draw_triangle(a, c, b, Color::new(50, 60, 50));
    ctx.draw_triangle(a, d, c, Color::new(50, 60, 50));
}

fn draw_viewport_border(ctx: &mut RenderContext) {
    let vp = ctx.viewport();
    let (x0, y0, x1, y1) = (vp.min_x as f32, vp.min_y as f32, vp.max_x as f32, vp.max_y as f32);
    let border = Color::new(90, 90, 120);
    ctx.draw_overlay_line(Vec3::new(x0, y0, -1.0), Vec3::new(x1, y0, -1.0), border);
    ctx.draw_overlay_line(Vec3::new(x1, y0, -1.0), Vec3::new(x1, y1, -1.0), border);
    ctx.draw_overlay_line(Vec3::new(x1, y1, -1.0), Vec3::new(x0, y1, -1.0), border);
    ctx.draw_overlay_line(Vec3::new(x0, y1, -1.0), Vec3::new(x0, y0, -1.0), border);
}

#[macroquad::main(window_conf)]
async fn main() {
    init_logging(LoggingConfig::default());

    let args: Vec<String> = std::env::args().collect();
    let config = load_render_config(args.get(1));
    let texture = load_texture(args.get(2));

    let mut ctx = match RenderContext::new(config) {
        Ok(ctx) => ctx,
        Err(e) => {
            log::error!("Invalid render config: {}", e);
            return;
        }
    };

    let cube = create_test_cube();
    let light_dir = Vec3::new(0.4, 0.7, 0.6);
    let mut snapshot = 0;

    loop {
        if is_key_pressed(KeyCode::Tab) {
            let next = match ctx.cull_face() {
                CullFace::Back => CullFace::Front,
                CullFace::Front => CullFace::Back,
            };
            ctx.set_cull_face(next);
            log::info!("Cull face: {:?}", next);
        }

        let t = get_time() as f32;

        ctx.clear(Color::new(16, 16, 24));
        ctx.clear_depth();

        draw_ground(&mut ctx);

        let spin = Mat4::rotation_y(t) * Mat4::rotation_x(t * 0.7);
        ctx.draw_mesh(&cube, &(Mat4::translation(-2.2, 0.0, -7.0) * spin), Material::Textured(&texture));
        ctx.draw_mesh(
            &cube,
            &(Mat4::translation(2.2, 0.0, -7.0) * Mat4::rotation_z(t * 0.5) * spin),
            Material::Lit { color: Color::new(120, 180, 255), light_dir },
        );

        // Swings through the near plane
        let z = -4.0 + 3.5 * (t * 0.8).sin();
        ctx.draw_mesh_edges(&cube, &(Mat4::translation(0.0, 1.5, z) * spin), Color::new(255, 220, 120));

        draw_viewport_border(&mut ctx);

        if is_key_pressed(KeyCode::P) {
            let path = PathBuf::from(format!("darkmatter-{:03}.png", snapshot));
            match ctx.framebuffer.save_png(&path) {
                Ok(()) => log::info!("Saved {}", path.display()),
                Err(e) => log::error!("Failed to save {}: {}", path.display(), e),
            }
            snapshot += 1;
        }

        // Present, scaled to fit the window
        let fb = &ctx.framebuffer;
        let fb_texture = Texture2D::from_rgba8(fb.width as u16, fb.height as u16, &fb.to_rgba_bytes());
        fb_texture.set_filter(FilterMode::Nearest);

        let scale = (screen_width() / fb.width as f32).min(screen_height() / fb.height as f32);
        let (draw_w, draw_h) = (fb.width as f32 * scale, fb.height as f32 * scale);
        clear_background(BLACK);
        draw_texture_ex(
            &fb_texture,
            (screen_width() - draw_w) * 0.5,
            (screen_height() - draw_h) * 0.5,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(draw_w, draw_h)),
                ..Default::default()
            },
        );

        next_frame().await
    }
}

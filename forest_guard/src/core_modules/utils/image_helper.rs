pub mod image_helper {
    use image::{ExtendedColorType, ImageEncoder, RgbImage};
    use image::codecs::png::PngEncoder;
    use std::io::{BufWriter, Write};
    use std::path::Path;

    /// Writes an RGB image as PNG to any writer.
    pub fn write_png<W: Write>(writer: W, image: &RgbImage) -> Result<(), image::error::ImageError> {
        let encoder = PngEncoder::new(writer);
        encoder.write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgb8,
        )
    }

    pub fn save_png(path: impl AsRef<Path>, image: &RgbImage) -> Result<(), image::error::ImageError> {
        let output = std::fs::File::create(path)?;
        let mut writer = BufWriter::new(output);
        write_png(&mut writer, image)?;
        writer.flush()?;
        Ok(())
    }

    /// Encodes an RGB image as an in-memory PNG, e.g. for display by a UI layer.
    pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, image::error::ImageError> {
        let mut buffer = Vec::new();
        write_png(&mut buffer, image)?;
        Ok(buffer)
    }
}

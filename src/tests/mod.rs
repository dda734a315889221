
#[test]
fn ex_readme_examples() -> Result<(), Box<dyn std::error::Error>> {
    use std::io::prelude::*;

    use futures::executor::block_on;

    use super::{DecoderOptions, DecodingWriter, TextDecoder, TextDecoderStream};

    let sjis: &[u8] = &[72, 101, 108, 108, 111, 32, 144, 162, 138, 69];
    let big5: &[u8] = &[72, 101, 108, 108, 111, 32, 165, 64, 172, 201];

    let decoded = block_on(async {
        let mut stream = TextDecoderStream::new("Shift_JIS")?;
        let mut dst = String::new();
        for chunk in sjis.chunks(3) {
            stream.writable().write(chunk).await?;
            // read eagerly so that the high-water mark is never exceeded
            if let Some(text) = futures::FutureExt::now_or_never(stream.readable().read()) {
                dst.extend(text?);
            }
        }
        stream.writable().close().await?;
        while let Some(text) = stream.readable().read().await? {
            dst.push_str(&text);
        }
        Ok::<_, Box<dyn std::error::Error>>(dst)
    })?;
    assert_eq!(decoded, "Hello 世界");

    let mut writer = DecodingWriter::new(
        String::new(),
        TextDecoder::for_label("big5", DecoderOptions::new())?,
    );
    writer.write_all(big5)?;
    let (decoded, result) = writer.finish();
    result?;
    assert_eq!(decoded, "Hello 世界");

    Ok(())
}

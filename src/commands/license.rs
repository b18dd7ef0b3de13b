//! License and credits text.

pub fn run() {
    println!(
        "asciiplay is open-source software, distributed under the MIT license.\n\
         \n\
         Built on:\n\
         \x20   FFmpeg    - decoding, scaling, resampling\n\
         \x20   cpal      - audio output\n\
         \x20   crossterm - terminal control\n"
    );
}

pub mod bitmap;
pub mod cursor;
pub mod midi;
pub mod palette;
pub mod quicktime;
pub mod script;
pub mod sound;
pub mod stringlist;

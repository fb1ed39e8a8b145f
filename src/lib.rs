/*
 *  lib.rs
 *
 *  RoboFace - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Robot face display driver for ST7735S TFT panels
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

pub mod command;
pub mod config;
pub mod display;
pub mod draw;
pub mod face;

pub use command::{Command, CommandError, CommandResult, Dispatcher, DriverState, Lifecycle};
pub use config::{Config, DisplayConfig, Rotation};
pub use face::Expression;

//! Hardware Abstraction Layer
//!
//! This module is an extension to `stm32f0xx_hal` that covers peripherals
//! not handled by the HAL in a way this project needs: bus transport over the
//! CAN driver and external interrupt lines.

pub mod can;
pub mod exti;
